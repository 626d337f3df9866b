//! Authoritative task and project list for one mounted view.
//!
//! Several `TaskStore`s may observe the same storage. Every local mutation is
//! persisted and then published; the other stores adopt the published snapshot
//! without writing it back.

pub mod sync;

use crate::clock::Clock;
use crate::domain::{ListGroup, Project, TimerContext, Todo};
use crate::persistence::{SharedStorage, StorageError, PROJECTS_KEY, TODOS_KEY};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use sync::{Signals, Subscription};
use tracing::{debug, trace, warn};

/// Where the latest unsaved change to a collection came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    /// Made through this store; must be written and published
    Local,
    /// Adopted from another observer's publish; already persisted by it
    External,
}

#[derive(Debug, Default)]
struct Replica {
    todos: Vec<Todo>,
    projects: Vec<Project>,
    todos_change: Option<Origin>,
    projects_change: Option<Origin>,
}

pub struct TaskStore {
    label: &'static str,
    storage: SharedStorage,
    signals: Rc<Signals>,
    clock: Rc<dyn Clock>,
    replica: Rc<RefCell<Replica>>,
    _subscriptions: Vec<Subscription>,
}

impl TaskStore {
    /// Load the persisted snapshot and start following other observers' publishes
    pub fn open(
        label: &'static str,
        storage: SharedStorage,
        signals: Rc<Signals>,
        clock: Rc<dyn Clock>,
    ) -> Self {
        let mut store = Self {
            label,
            storage,
            signals,
            clock,
            replica: Rc::new(RefCell::new(Replica::default())),
            _subscriptions: Vec::new(),
        };

        let (todos, projects) = store.load();
        {
            let mut replica = store.replica.borrow_mut();
            replica.todos = todos;
            replica.projects = projects;
        }

        let todos_sub = {
            let replica = Rc::downgrade(&store.replica);
            store
                .signals
                .todos_updated
                .subscribe(move |incoming: &Vec<Todo>| adopt_todos(label, &replica, incoming))
        };
        let projects_sub = {
            let replica = Rc::downgrade(&store.replica);
            store
                .signals
                .projects_updated
                .subscribe(move |incoming: &Vec<Project>| adopt_projects(label, &replica, incoming))
        };
        store._subscriptions = vec![todos_sub, projects_sub];

        debug!(observer = label, "Task store opened");
        store
    }

    /// Read both collections from storage.
    ///
    /// Corrupt JSON or a non-array value yields an empty collection for that key.
    /// Individual records of the wrong shape are dropped, and when any were the
    /// cleaned collection is written back straight away.
    pub fn load(&self) -> (Vec<Todo>, Vec<Project>) {
        let (mut todos, dropped_todos) = load_collection::<Todo>(&self.storage, TODOS_KEY);
        for todo in &mut todos {
            todo.normalize();
        }
        let (projects, dropped_projects) =
            load_collection::<Project>(&self.storage, PROJECTS_KEY);

        if dropped_todos > 0 {
            warn!(dropped = dropped_todos, "Dropped malformed todos while loading");
            if self.write(TODOS_KEY, &todos) {
                self.signals.todos_updated.publish(todos.clone());
            }
        }
        if dropped_projects > 0 {
            warn!(dropped = dropped_projects, "Dropped malformed projects while loading");
            if self.write(PROJECTS_KEY, &projects) {
                self.signals.projects_updated.publish(projects.clone());
            }
        }

        (todos, projects)
    }

    /// Add a task. Returns None (and changes nothing) when the text is blank.
    pub fn create(&self, text: &str, project_id: Option<&str>) -> Option<Todo> {
        let todo = Todo::new(text, project_id.map(str::to_string), self.clock.now())?;
        self.mutate(|replica| {
            replica.todos.push(todo.clone());
            replica.todos_change = Some(Origin::Local);
            Some(todo)
        })
    }

    /// Add a project. Returns None when the name is blank.
    pub fn create_project(&self, name: &str) -> Option<Project> {
        let project = Project::new(name, self.clock.now())?;
        self.mutate(|replica| {
            replica.projects.push(project.clone());
            replica.projects_change = Some(Origin::Local);
            Some(project)
        })
    }

    /// Flip completion. Completing while a session is active attributes the
    /// session's elapsed time to the task.
    pub fn toggle(&self, todo_id: &str, ctx: &TimerContext) -> Option<Todo> {
        let now = self.clock.now();
        self.mutate(|replica| {
            let todo = replica.todos.iter_mut().find(|t| t.id == todo_id)?;
            if todo.completed {
                todo.reopen();
            } else {
                todo.complete(ctx, now);
                debug!(
                    todo_id,
                    session_id = ?todo.session_id,
                    time_spent = ?todo.time_spent,
                    "Task completed"
                );
            }
            let updated = todo.clone();
            replica.todos_change = Some(Origin::Local);
            Some(updated)
        })
    }

    /// Remove a task
    pub fn delete(&self, todo_id: &str) -> bool {
        self.mutate(|replica| {
            let before = replica.todos.len();
            replica.todos.retain(|t| t.id != todo_id);
            if replica.todos.len() == before {
                return None;
            }
            replica.todos_change = Some(Origin::Local);
            Some(())
        })
        .is_some()
    }

    /// Remove a project. Its tasks stay, unfiled.
    pub fn delete_project(&self, project_id: &str) -> bool {
        self.mutate(|replica| {
            let before = replica.projects.len();
            replica.projects.retain(|p| p.id != project_id);
            if replica.projects.len() == before {
                return None;
            }
            replica.projects_change = Some(Origin::Local);

            let mut unfiled = 0;
            for todo in &mut replica.todos {
                if todo.project_id.as_deref() == Some(project_id) {
                    todo.project_id = None;
                    unfiled += 1;
                }
            }
            if unfiled > 0 {
                replica.todos_change = Some(Origin::Local);
            }
            Some(())
        })
        .is_some()
    }

    /// Move the task at `from` to `to` within one group (indices in display
    /// order), then renumber the whole group densely from the current time.
    pub fn reorder(&self, group: &ListGroup, from: usize, to: usize) -> bool {
        let base = self.clock.now();
        self.mutate(|replica| {
            let mut members = group_indices(&replica.todos, group);
            if from >= members.len() || to >= members.len() {
                return None;
            }

            let moved = members.remove(from);
            members.insert(to, moved);

            for (position, &index) in members.iter().enumerate() {
                replica.todos[index].order = base - position as i64;
            }
            replica.todos_change = Some(Origin::Local);
            Some(())
        })
        .is_some()
    }

    /// Remove every task and project
    pub fn clear_all(&self) {
        self.mutate(|replica| {
            replica.todos.clear();
            replica.projects.clear();
            replica.todos_change = Some(Origin::Local);
            replica.projects_change = Some(Origin::Local);
            Some(())
        });
    }

    /// Write a full snapshot of both collections and announce it.
    /// Failures are logged; returns whether both writes succeeded.
    pub fn persist(&self, todos: &[Todo], projects: &[Project]) -> bool {
        let todos_ok = self.write(TODOS_KEY, todos);
        if todos_ok {
            self.signals.todos_updated.publish(todos.to_vec());
        }
        let projects_ok = self.write(PROJECTS_KEY, projects);
        if projects_ok {
            self.signals.projects_updated.publish(projects.to_vec());
        }
        todos_ok && projects_ok
    }

    /// Persistence step: write and publish local changes; changes adopted from
    /// other observers are already persisted and are only acknowledged.
    pub fn flush(&self) {
        let (todos, projects) = {
            let mut replica = self.replica.borrow_mut();
            let todos = match replica.todos_change.take() {
                Some(Origin::Local) => Some(replica.todos.clone()),
                Some(Origin::External) => {
                    trace!(observer = self.label, "Skipping write of adopted todos");
                    None
                }
                None => None,
            };
            let projects = match replica.projects_change.take() {
                Some(Origin::Local) => Some(replica.projects.clone()),
                Some(Origin::External) => {
                    trace!(observer = self.label, "Skipping write of adopted projects");
                    None
                }
                None => None,
            };
            (todos, projects)
        };

        if let Some(todos) = todos {
            if self.write(TODOS_KEY, &todos) {
                self.signals.todos_updated.publish(todos);
            }
        }
        if let Some(projects) = projects {
            if self.write(PROJECTS_KEY, &projects) {
                self.signals.projects_updated.publish(projects);
            }
        }
    }

    pub fn todos(&self) -> Vec<Todo> {
        self.replica.borrow().todos.clone()
    }

    pub fn projects(&self) -> Vec<Project> {
        let mut projects = self.replica.borrow().projects.clone();
        projects.sort_by(|a, b| b.order.cmp(&a.order));
        projects
    }

    /// Members of one group in display order
    pub fn group(&self, group: &ListGroup) -> Vec<Todo> {
        let replica = self.replica.borrow();
        group_indices(&replica.todos, group)
            .into_iter()
            .map(|i| replica.todos[i].clone())
            .collect()
    }

    /// Open tasks across all projects, display order
    pub fn active(&self) -> Vec<Todo> {
        self.sorted_where(|t| !t.completed)
    }

    /// Completed tasks across all projects, display order
    pub fn completed(&self) -> Vec<Todo> {
        self.sorted_where(|t| t.completed)
    }

    /// Tasks whose id starts with `prefix`
    pub fn find_by_prefix(&self, prefix: &str) -> Vec<Todo> {
        self.replica
            .borrow()
            .todos
            .iter()
            .filter(|t| t.id.starts_with(prefix))
            .cloned()
            .collect()
    }

    pub fn project_name(&self, project_id: &str) -> Option<String> {
        self.replica
            .borrow()
            .projects
            .iter()
            .find(|p| p.id == project_id)
            .map(|p| p.name.clone())
    }

    fn sorted_where(&self, keep: impl Fn(&Todo) -> bool) -> Vec<Todo> {
        let mut todos: Vec<Todo> = self
            .replica
            .borrow()
            .todos
            .iter()
            .filter(|t| keep(t))
            .cloned()
            .collect();
        todos.sort_by(|a, b| b.order.cmp(&a.order));
        todos
    }

    /// Apply a change to the replica, then run the persistence step if it changed anything
    fn mutate<R>(&self, change: impl FnOnce(&mut Replica) -> Option<R>) -> Option<R> {
        let result = change(&mut self.replica.borrow_mut());
        if result.is_some() {
            self.flush();
        }
        result
    }

    /// Write one collection. Storage failures are logged and swallowed: the
    /// in-memory state stays authoritative for the rest of the session.
    fn write<T: Serialize>(&self, key: &str, items: &[T]) -> bool {
        let result = serde_json::to_string(items)
            .map_err(|source| StorageError::Serialize {
                key: key.to_string(),
                source,
            })
            .and_then(|json| self.storage.borrow_mut().set(key, &json));

        match result {
            Ok(()) => {
                trace!(observer = self.label, key, count = items.len(), "Persisted");
                true
            }
            Err(e) => {
                warn!(observer = self.label, key, error = %e, "Failed to persist; keeping in-memory state");
                false
            }
        }
    }
}

/// Indices of a group's members, sorted by display order (higher `order` first)
fn group_indices(todos: &[Todo], group: &ListGroup) -> Vec<usize> {
    let mut indices: Vec<usize> = todos
        .iter()
        .enumerate()
        .filter(|(_, t)| group.contains(t))
        .map(|(i, _)| i)
        .collect();
    indices.sort_by(|a, b| todos[*b].order.cmp(&todos[*a].order));
    indices
}

fn load_collection<T: DeserializeOwned>(storage: &SharedStorage, key: &str) -> (Vec<T>, usize) {
    let raw = match storage.borrow().get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return (Vec::new(), 0),
        Err(e) => {
            warn!(key, error = %e, "Could not read stored data, starting empty");
            return (Vec::new(), 0);
        }
    };

    let items = match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Array(items)) => items,
        Ok(_) => {
            warn!(key, "Stored data is not a list, starting empty");
            return (Vec::new(), 0);
        }
        Err(e) => {
            warn!(key, error = %e, "Stored data is not valid JSON, starting empty");
            return (Vec::new(), 0);
        }
    };

    let total = items.len();
    let valid: Vec<T> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();
    let dropped = total - valid.len();
    (valid, dropped)
}

/// Compare two collections by content, ignoring order
fn same_content<T: PartialEq>(current: &[T], incoming: &[T], id: impl Fn(&T) -> &str) -> bool {
    if current.len() != incoming.len() {
        return false;
    }
    let mut a: Vec<&T> = current.iter().collect();
    let mut b: Vec<&T> = incoming.iter().collect();
    a.sort_by(|x, y| id(*x).cmp(id(*y)));
    b.sort_by(|x, y| id(*x).cmp(id(*y)));
    a == b
}

fn adopt_todos(label: &'static str, replica: &Weak<RefCell<Replica>>, incoming: &[Todo]) {
    let Some(replica) = replica.upgrade() else {
        return;
    };
    let mut state = replica.borrow_mut();
    if same_content(&state.todos, incoming, |t| t.id.as_str()) {
        return;
    }
    state.todos = incoming.to_vec();
    state.todos_change = Some(Origin::External);
    debug!(observer = label, count = incoming.len(), "Adopted published todos");
}

fn adopt_projects(label: &'static str, replica: &Weak<RefCell<Replica>>, incoming: &[Project]) {
    let Some(replica) = replica.upgrade() else {
        return;
    };
    let mut state = replica.borrow_mut();
    if same_content(&state.projects, incoming, |p| p.id.as_str()) {
        return;
    }
    state.projects = incoming.to_vec();
    state.projects_change = Some(Origin::External);
    debug!(observer = label, count = incoming.len(), "Adopted published projects");
}
