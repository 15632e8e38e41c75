use std::collections::HashMap;

use sauron::{
    html::{attributes::*, *},
    prelude::*,
};
use shared::{CreateTaskRequest, Task, TaskFilter, UpdateTaskRequest};
use uuid::Uuid;
use web_sys::{console, window};

mod api;

/// Explicit dialog state so view/edit/delete flags cannot combine.
#[derive(Debug, Clone, PartialEq)]
pub enum Dialog {
    Closed,
    Viewing(Uuid),
    Editing(Uuid),
    ConfirmingDelete(Uuid),
}

#[derive(Debug, Clone)]
pub enum Msg {
    // List
    LoadTasks,
    TasksLoaded(Vec<Task>),
    LoadFailed(String),
    SetFilter(TaskFilter),

    // Create form
    SetNewTitle(String),
    SetNewDescription(String),
    SubmitCreate,
    TaskCreated,
    CreateFailed(String),

    // Optimistic completion toggle
    ToggleTask(Uuid),
    ToggleSynced(Task),
    ToggleFailed(Uuid, bool, String),

    // Detail dialog
    OpenTask(Uuid),
    StartEdit,
    CancelEdit,
    SetEditTitle(String),
    SetEditDescription(String),
    SaveEdit,
    EditSaved {
        id: Uuid,
        title: String,
        description: Option<String>,
    },
    EditFailed(String),

    // Delete dialog
    RequestDelete(Uuid),
    ConfirmDelete,
    TaskDeleted(Uuid),
    DeleteFailed(String),

    CloseDialog,
}

#[derive(Debug, Clone)]
pub struct Model {
    tasks: Vec<Task>,
    loading: bool,
    load_error: Option<String>,
    new_title: String,
    new_description: String,
    creating: bool,
    filter: TaskFilter,
    dialog: Dialog,
    edit_title: String,
    edit_description: String,
    // Completed-value currently in flight, per task. While an entry exists
    // further toggles on that task only mutate local state; a follow-up
    // request is issued when the in-flight one lands.
    syncing: HashMap<Uuid, bool>,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            loading: true,
            load_error: None,
            new_title: String::new(),
            new_description: String::new(),
            creating: false,
            filter: TaskFilter::All,
            dialog: Dialog::Closed,
            edit_title: String::new(),
            edit_description: String::new(),
            syncing: HashMap::new(),
        }
    }
}

fn alert(message: &str) {
    if let Some(window) = window() {
        let _ = window.alert_with_message(message);
    }
}

fn sync_toggle(id: Uuid, target: bool) -> Cmd<Msg> {
    Cmd::new(async move {
        let patch = UpdateTaskRequest {
            completed: Some(target),
            ..Default::default()
        };
        match api::update_task(id, &patch).await {
            Ok(task) => Msg::ToggleSynced(task),
            Err(e) => Msg::ToggleFailed(id, !target, e),
        }
    })
}

impl Application for Model {
    type MSG = Msg;

    fn init(&mut self) -> Cmd<Msg> {
        Cmd::new(async { Msg::LoadTasks })
    }

    fn update(&mut self, msg: Msg) -> Cmd<Msg> {
        match msg {
            Msg::LoadTasks => {
                self.loading = true;
                Cmd::new(async {
                    match api::fetch_tasks().await {
                        Ok(tasks) => Msg::TasksLoaded(tasks),
                        Err(e) => Msg::LoadFailed(e),
                    }
                })
            }
            Msg::TasksLoaded(tasks) => {
                self.tasks = tasks;
                self.loading = false;
                self.load_error = None;
                Cmd::none()
            }
            Msg::LoadFailed(error) => {
                console::log_1(&format!("Failed to load tasks: {}", error).into());
                self.loading = false;
                self.load_error =
                    Some("Failed to load tasks. Ensure backend is running.".to_string());
                Cmd::none()
            }
            Msg::SetFilter(filter) => {
                self.filter = filter;
                Cmd::none()
            }
            Msg::SetNewTitle(title) => {
                self.new_title = title;
                Cmd::none()
            }
            Msg::SetNewDescription(description) => {
                self.new_description = description;
                Cmd::none()
            }
            Msg::SubmitCreate => {
                if self.creating || self.new_title.trim().is_empty() {
                    return Cmd::none();
                }
                self.creating = true;

                let request = CreateTaskRequest {
                    title: self.new_title.clone(),
                    description: if self.new_description.trim().is_empty() {
                        None
                    } else {
                        Some(self.new_description.clone())
                    },
                };
                Cmd::new(async move {
                    match api::create_task(&request).await {
                        Ok(_) => Msg::TaskCreated,
                        Err(e) => Msg::CreateFailed(e),
                    }
                })
            }
            Msg::TaskCreated => {
                self.creating = false;
                self.new_title.clear();
                self.new_description.clear();
                // Full refetch rather than an optimistic insert.
                Cmd::new(async { Msg::LoadTasks })
            }
            Msg::CreateFailed(error) => {
                console::log_1(&format!("Create failed: {}", error).into());
                self.creating = false;
                alert("Failed to create task");
                Cmd::none()
            }
            Msg::ToggleTask(id) => {
                let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
                    return Cmd::none();
                };
                task.completed = !task.completed;
                let target = task.completed;

                if self.syncing.contains_key(&id) {
                    // A request is already in flight; ToggleSynced will
                    // reconcile once it lands.
                    return Cmd::none();
                }
                self.syncing.insert(id, target);
                sync_toggle(id, target)
            }
            Msg::ToggleSynced(server_task) => {
                let id = server_task.id;
                self.syncing.remove(&id);
                let Some(task) = self.tasks.iter().find(|t| t.id == id) else {
                    return Cmd::none();
                };
                if task.completed != server_task.completed {
                    // Toggled again while the request was in flight.
                    let target = task.completed;
                    self.syncing.insert(id, target);
                    sync_toggle(id, target)
                } else {
                    Cmd::none()
                }
            }
            Msg::ToggleFailed(id, confirmed, error) => {
                console::log_1(&format!("Toggle failed: {}", error).into());
                self.syncing.remove(&id);
                if let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) {
                    task.completed = confirmed;
                }
                alert("Failed to update task");
                Cmd::none()
            }
            Msg::OpenTask(id) => {
                if let Some(task) = self.tasks.iter().find(|t| t.id == id) {
                    self.dialog = Dialog::Viewing(id);
                    self.edit_title = task.title.clone();
                    self.edit_description = task.description.clone().unwrap_or_default();
                }
                Cmd::none()
            }
            Msg::StartEdit => {
                if let Dialog::Viewing(id) = self.dialog {
                    self.dialog = Dialog::Editing(id);
                }
                Cmd::none()
            }
            Msg::CancelEdit => {
                if let Dialog::Editing(id) = self.dialog {
                    if let Some(task) = self.tasks.iter().find(|t| t.id == id) {
                        self.edit_title = task.title.clone();
                        self.edit_description = task.description.clone().unwrap_or_default();
                    }
                    self.dialog = Dialog::Viewing(id);
                }
                Cmd::none()
            }
            Msg::SetEditTitle(title) => {
                self.edit_title = title;
                Cmd::none()
            }
            Msg::SetEditDescription(description) => {
                self.edit_description = description;
                Cmd::none()
            }
            Msg::SaveEdit => {
                let Dialog::Editing(id) = self.dialog else {
                    return Cmd::none();
                };
                if self.edit_title.trim().is_empty() {
                    return Cmd::none();
                }

                let title = self.edit_title.clone();
                let description = if self.edit_description.trim().is_empty() {
                    None
                } else {
                    Some(self.edit_description.clone())
                };
                let patch = UpdateTaskRequest {
                    title: Some(title.clone()),
                    description: Some(description.clone()),
                    completed: None,
                };
                Cmd::new(async move {
                    match api::update_task(id, &patch).await {
                        // Local state is updated from the edited values, not
                        // the server echo.
                        Ok(_) => Msg::EditSaved {
                            id,
                            title,
                            description,
                        },
                        Err(e) => Msg::EditFailed(e),
                    }
                })
            }
            Msg::EditSaved {
                id,
                title,
                description,
            } => {
                if let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) {
                    task.title = title;
                    task.description = description;
                }
                self.dialog = Dialog::Closed;
                Cmd::none()
            }
            Msg::EditFailed(error) => {
                console::log_1(&format!("Edit failed: {}", error).into());
                alert("Failed to update task");
                Cmd::none()
            }
            Msg::RequestDelete(id) => {
                self.dialog = Dialog::ConfirmingDelete(id);
                Cmd::none()
            }
            Msg::ConfirmDelete => {
                let Dialog::ConfirmingDelete(id) = self.dialog else {
                    return Cmd::none();
                };
                Cmd::new(async move {
                    match api::delete_task(id).await {
                        Ok(()) => Msg::TaskDeleted(id),
                        Err(e) => Msg::DeleteFailed(e),
                    }
                })
            }
            Msg::TaskDeleted(id) => {
                self.tasks.retain(|t| t.id != id);
                self.dialog = Dialog::Closed;
                Cmd::none()
            }
            Msg::DeleteFailed(error) => {
                console::log_1(&format!("Delete failed: {}", error).into());
                alert("Failed to delete task");
                Cmd::none()
            }
            Msg::CloseDialog => {
                self.dialog = Dialog::Closed;
                Cmd::none()
            }
        }
    }

    fn view(&self) -> Node<Msg> {
        if let Some(error) = &self.load_error {
            return div(
                [class("min-h-screen flex items-center justify-center bg-ctp-base")],
                [div(
                    [class("text-ctp-red text-center mt-10")],
                    [text(error)],
                )],
            );
        }

        div(
            [class("min-h-screen bg-ctp-base text-ctp-text")],
            [
                self.view_header(),
                div(
                    [class("max-w-4xl mx-auto px-6 py-8 space-y-8")],
                    [
                        self.view_create_form(),
                        self.view_filter_bar(),
                        if self.loading {
                            div(
                                [class("text-center py-10 text-ctp-subtext0 italic")],
                                [text("Loading...")],
                            )
                        } else {
                            self.view_task_list()
                        },
                    ],
                ),
                self.view_dialog(),
            ],
        )
    }
}

impl Model {
    fn view_header(&self) -> Node<Msg> {
        header(
            [class("bg-ctp-mantle shadow-lg border-b border-ctp-surface0")],
            [div(
                [class("max-w-4xl mx-auto px-6 py-4")],
                [
                    h1([class("text-2xl font-bold text-ctp-text")], [text("My Tasks")]),
                    p(
                        [class("text-sm text-ctp-subtext0")],
                        [text("Simple. Fast. Productive.")],
                    ),
                ],
            )],
        )
    }

    fn view_create_form(&self) -> Node<Msg> {
        let blocked = self.creating || self.new_title.trim().is_empty();

        div(
            [class("p-6 bg-ctp-surface1 rounded-lg border border-ctp-surface2")],
            [
                h2(
                    [class("text-xl font-semibold text-ctp-text mb-4 pb-2 border-b border-ctp-surface2")],
                    [text("Add New Task")],
                ),
                div(
                    [class("space-y-4")],
                    [
                        input(
                            [
                                r#type("text"),
                                placeholder("Task title..."),
                                value(&self.new_title),
                                on_input(|event| Msg::SetNewTitle(event.value())),
                                class("w-full px-3 py-2 bg-ctp-surface0 border border-ctp-surface2 rounded-md text-ctp-text"),
                            ],
                            [],
                        ),
                        textarea(
                            [
                                placeholder("Description (optional)"),
                                value(&self.new_description),
                                on_input(|event| Msg::SetNewDescription(event.value())),
                                class("w-full px-3 py-2 bg-ctp-surface0 border border-ctp-surface2 rounded-md text-ctp-text h-20 resize-y"),
                            ],
                            [],
                        ),
                        button(
                            [
                                on_click(|_| Msg::SubmitCreate),
                                disabled(blocked),
                                class("bg-ctp-blue hover:bg-ctp-sapphire text-ctp-base font-medium px-6 py-2 rounded-md disabled:opacity-50"),
                            ],
                            [if self.creating {
                                text("Adding...")
                            } else {
                                text("Add Task")
                            }],
                        ),
                    ],
                ),
            ],
        )
    }

    fn view_filter_bar(&self) -> Node<Msg> {
        div(
            [class("flex gap-2")],
            TaskFilter::ALL
                .iter()
                .map(|filter| self.filter_button(*filter))
                .collect::<Vec<_>>(),
        )
    }

    fn filter_button(&self, filter: TaskFilter) -> Node<Msg> {
        let is_active = self.filter == filter;
        button(
            [
                on_click(move |_| Msg::SetFilter(filter)),
                class(&format!(
                    "w-24 px-3 py-2 rounded-md text-sm font-medium {}",
                    if is_active {
                        "bg-ctp-blue text-ctp-base"
                    } else {
                        "text-ctp-subtext0 hover:text-ctp-text hover:bg-ctp-surface0 border border-ctp-surface2"
                    }
                )),
            ],
            [text(filter.label())],
        )
    }

    fn view_task_list(&self) -> Node<Msg> {
        let visible: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|t| self.filter.matches(t))
            .collect();

        if visible.is_empty() {
            div(
                [class("text-center py-10 text-ctp-subtext0")],
                [text(&format!(
                    "No {} tasks found.",
                    self.filter.label().to_lowercase()
                ))],
            )
        } else {
            div(
                [class("space-y-4")],
                visible
                    .iter()
                    .map(|task| self.view_task(task))
                    .collect::<Vec<_>>(),
            )
        }
    }

    fn view_task(&self, task: &Task) -> Node<Msg> {
        let is_syncing = self.syncing.contains_key(&task.id);
        let task_id = task.id;

        div(
            [
                key(task.id.to_string()),
                class(&format!(
                    "border rounded-xl p-4 bg-ctp-surface0 shadow-sm flex items-start gap-4 {}",
                    if task.completed {
                        "border-ctp-green bg-ctp-green/10 opacity-60"
                    } else {
                        "border-ctp-surface1 hover:border-ctp-blue"
                    }
                )),
            ],
            [
                input(
                    [
                        r#type("checkbox"),
                        checked(task.completed),
                        on_click(move |_| Msg::ToggleTask(task_id)),
                        class("mt-1 w-5 h-5 cursor-pointer"),
                    ],
                    [],
                ),
                div(
                    [
                        class("flex-1 min-w-0 cursor-pointer"),
                        on_click(move |_| Msg::OpenTask(task_id)),
                    ],
                    [
                        h3(
                            [class(&format!(
                                "font-semibold {}",
                                if task.completed {
                                    "line-through text-ctp-overlay1"
                                } else {
                                    "text-ctp-text"
                                }
                            ))],
                            [if is_syncing {
                                text(&format!("{} (updating...)", task.title))
                            } else {
                                text(&task.title)
                            }],
                        ),
                        match &task.description {
                            Some(description) => p(
                                [class("text-sm text-ctp-subtext1 break-words")],
                                [text(description)],
                            ),
                            None => span([], []),
                        },
                        p(
                            [class("text-xs text-ctp-subtext0 pt-2")],
                            [text(&task.created_at.format("%Y-%m-%d").to_string())],
                        ),
                    ],
                ),
                button(
                    [
                        on_click(move |_| Msg::RequestDelete(task_id)),
                        class("text-ctp-red hover:bg-ctp-red/10 rounded-lg w-8 h-8"),
                        r#type("button"),
                    ],
                    [text("✕")],
                ),
            ],
        )
    }

    fn view_dialog(&self) -> Node<Msg> {
        let task = match self.dialog {
            Dialog::Closed => None,
            Dialog::Viewing(id) | Dialog::Editing(id) | Dialog::ConfirmingDelete(id) => {
                self.tasks.iter().find(|t| t.id == id)
            }
        };
        let Some(task) = task else {
            return span([], []);
        };

        let body = match self.dialog {
            Dialog::Viewing(_) => self.view_task_details(task),
            Dialog::Editing(_) => self.view_edit_form(),
            Dialog::ConfirmingDelete(_) => self.view_delete_confirmation(task),
            Dialog::Closed => span([], []),
        };

        div(
            [class("fixed inset-0 bg-black/50 flex items-center justify-center p-4")],
            [div(
                [class("bg-ctp-surface0 rounded-lg shadow-lg p-6 w-full max-w-md border border-ctp-surface1")],
                [body],
            )],
        )
    }

    fn view_task_details(&self, task: &Task) -> Node<Msg> {
        div(
            [class("space-y-4")],
            [
                h2([class("text-xl font-bold text-ctp-text")], [text("Task Details")]),
                h3([class("font-semibold text-lg")], [text(&task.title)]),
                p(
                    [class("text-ctp-subtext1 whitespace-pre-wrap")],
                    [match &task.description {
                        Some(description) => text(description),
                        None => text("No description provided."),
                    }],
                ),
                p(
                    [class("text-xs text-ctp-subtext0")],
                    [text(&format!(
                        "Created: {}",
                        task.created_at.format("%Y-%m-%d %H:%M")
                    ))],
                ),
                div(
                    [class("flex justify-end gap-2")],
                    [
                        button(
                            [
                                on_click(|_| Msg::CloseDialog),
                                class("px-4 py-2 rounded-md border border-ctp-surface2 text-ctp-text"),
                            ],
                            [text("Close")],
                        ),
                        button(
                            [
                                on_click(|_| Msg::StartEdit),
                                class("bg-ctp-blue text-ctp-base px-4 py-2 rounded-md"),
                            ],
                            [text("Edit Task")],
                        ),
                    ],
                ),
            ],
        )
    }

    fn view_edit_form(&self) -> Node<Msg> {
        div(
            [class("space-y-4")],
            [
                h2([class("text-xl font-bold text-ctp-text")], [text("Edit Task")]),
                input(
                    [
                        r#type("text"),
                        placeholder("Task Title"),
                        value(&self.edit_title),
                        on_input(|event| Msg::SetEditTitle(event.value())),
                        class("w-full px-3 py-2 bg-ctp-surface1 border border-ctp-surface2 rounded-md text-ctp-text"),
                    ],
                    [],
                ),
                textarea(
                    [
                        placeholder("Description"),
                        value(&self.edit_description),
                        on_input(|event| Msg::SetEditDescription(event.value())),
                        class("w-full px-3 py-2 bg-ctp-surface1 border border-ctp-surface2 rounded-md text-ctp-text h-32 resize-y"),
                    ],
                    [],
                ),
                div(
                    [class("flex justify-end gap-2")],
                    [
                        button(
                            [
                                on_click(|_| Msg::CancelEdit),
                                class("px-4 py-2 rounded-md border border-ctp-surface2 text-ctp-text"),
                            ],
                            [text("Cancel")],
                        ),
                        button(
                            [
                                on_click(|_| Msg::SaveEdit),
                                disabled(self.edit_title.trim().is_empty()),
                                class("bg-ctp-green text-ctp-base px-4 py-2 rounded-md disabled:opacity-50"),
                            ],
                            [text("Save Changes")],
                        ),
                    ],
                ),
            ],
        )
    }

    fn view_delete_confirmation(&self, task: &Task) -> Node<Msg> {
        div(
            [class("space-y-4")],
            [
                h2([class("text-xl font-bold text-ctp-text")], [text("Delete Task?")]),
                p(
                    [class("text-ctp-subtext1")],
                    [text(&format!(
                        "Are you sure you want to delete \"{}\"? This action cannot be undone.",
                        task.title
                    ))],
                ),
                div(
                    [class("flex justify-end gap-2")],
                    [
                        button(
                            [
                                on_click(|_| Msg::CloseDialog),
                                class("px-4 py-2 rounded-md border border-ctp-surface2 text-ctp-text"),
                            ],
                            [text("Cancel")],
                        ),
                        button(
                            [
                                on_click(|_| Msg::ConfirmDelete),
                                class("bg-ctp-red text-ctp-base px-4 py-2 rounded-md"),
                            ],
                            [text("Delete")],
                        ),
                    ],
                ),
            ],
        )
    }
}

#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    Program::mount_to_body(Model::default());
}
