use sauron::{
    html::{attributes::*, *},
    prelude::*,
};
use shared::{CreateTodoRequest, Todo, UpdateTodoRequest};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

/// Address of the todo service. Overridable at build time via
/// `TODO_API_BASE_URL`.
const API_BASE_URL: &str = match option_env!("TODO_API_BASE_URL") {
    Some(url) => url,
    None => "http://127.0.0.1:5000",
};

const LOAD_ERROR_TEXT: &str = "Error loading todos. Is the backend running?";
const EMPTY_LIST_TEXT: &str = "No tasks yet!";

#[derive(Debug, Clone)]
pub enum Msg {
    // List lifecycle
    LoadTodos,
    TodosLoaded(Vec<Todo>),
    LoadFailed(String),

    // Add form
    SetNewTask(String),
    AddTodo,
    TodoAdded,

    // Row actions
    ToggleCompleted(u64),
    DeleteTodo(u64),
    StartEdit(u64),
    SetEditText(String),
    SaveEdit(u64),
    CancelEdit,

    // Every successful mutation funnels through here: the server response
    // is the new truth, so the whole list is pulled again.
    MutationDone,
    ActionFailed(String, String),
    NoOp,
}

#[derive(Debug, Clone, Default)]
pub struct Model {
    todos: Vec<Todo>,
    new_task: String,
    editing_todo: Option<u64>,
    edit_text: String,
    loading: bool,
    load_error: Option<String>,
}

impl Application for Model {
    type MSG = Msg;

    fn init(&mut self) -> Cmd<Msg> {
        Cmd::new(async { Msg::LoadTodos })
    }

    fn update(&mut self, msg: Msg) -> Cmd<Msg> {
        match msg {
            Msg::LoadTodos => {
                self.loading = true;
                load_todos_cmd()
            }
            Msg::TodosLoaded(todos) => {
                self.todos = todos;
                self.loading = false;
                self.load_error = None;
                Cmd::none()
            }
            Msg::LoadFailed(error) => {
                log_error(&format!("Failed to fetch todos: {error}"));
                self.loading = false;
                self.load_error = Some(error);
                Cmd::none()
            }
            Msg::SetNewTask(text) => {
                self.new_task = text;
                Cmd::none()
            }
            Msg::AddTodo => {
                let Some(task) = trimmed_non_empty(&self.new_task) else {
                    alert("Task description cannot be empty.");
                    return Cmd::none();
                };
                let task = task.to_string();
                Cmd::new(async move {
                    match create_todo(task).await {
                        Ok(()) => Msg::TodoAdded,
                        Err(e) => Msg::ActionFailed("Failed to add task".to_string(), e),
                    }
                })
            }
            Msg::TodoAdded => {
                self.new_task.clear();
                load_todos_cmd()
            }
            Msg::ToggleCompleted(id) => {
                let Some(todo) = self.todos.iter().find(|t| t.id == id) else {
                    return Cmd::none();
                };
                let new_completed = !todo.completed;
                Cmd::new(async move {
                    match update_todo(id, UpdateTodoRequest::completed(new_completed)).await {
                        Ok(()) => Msg::MutationDone,
                        Err(e) => Msg::ActionFailed(format!("Failed to update task {id}"), e),
                    }
                })
            }
            Msg::DeleteTodo(id) => Cmd::new(async move {
                match delete_todo(id).await {
                    Ok(()) => Msg::MutationDone,
                    Err(e) => Msg::ActionFailed(format!("Failed to delete task {id}"), e),
                }
            }),
            Msg::StartEdit(id) => {
                if let Some(todo) = self.todos.iter().find(|t| t.id == id) {
                    self.editing_todo = Some(id);
                    self.edit_text = todo.task.clone();
                }
                Cmd::none()
            }
            Msg::SetEditText(text) => {
                self.edit_text = text;
                Cmd::none()
            }
            Msg::SaveEdit(id) => {
                // Stale clicks (row already re-rendered or edit cancelled)
                // must not issue a request.
                if self.editing_todo != Some(id) {
                    return Cmd::none();
                }
                self.editing_todo = None;
                let original = self
                    .todos
                    .iter()
                    .find(|t| t.id == id)
                    .map(|t| t.task.as_str())
                    .unwrap_or("");
                match edit_outcome(original, &self.edit_text) {
                    Some(new_task) => Cmd::new(async move {
                        match update_todo(id, UpdateTodoRequest::task(new_task)).await {
                            Ok(()) => Msg::MutationDone,
                            Err(e) => {
                                Msg::ActionFailed(format!("Failed to update task {id}"), e)
                            }
                        }
                    }),
                    None => Cmd::none(),
                }
            }
            Msg::CancelEdit => {
                self.editing_todo = None;
                self.edit_text.clear();
                Cmd::none()
            }
            Msg::MutationDone => load_todos_cmd(),
            Msg::ActionFailed(action, error) => {
                log_error(&format!("{action}: {error}"));
                alert(&format!("{action}. See console for details."));
                Cmd::none()
            }
            Msg::NoOp => Cmd::none(),
        }
    }

    fn view(&self) -> Node<Msg> {
        div(
            [class("min-h-screen bg-ctp-base text-ctp-text")],
            [div(
                [class("max-w-xl mx-auto px-6 py-8")],
                [
                    h1([class("text-2xl font-bold mb-6")], [text("Todo List")]),
                    self.view_add_form(),
                    if self.loading {
                        div(
                            [class("text-center py-10 text-ctp-subtext0 italic")],
                            [text("Loading...")],
                        )
                    } else {
                        self.view_todo_list()
                    },
                ],
            )],
        )
    }
}

impl Model {
    fn view_add_form(&self) -> Node<Msg> {
        div(
            [class("mb-6 flex gap-2")],
            [
                input(
                    [
                        r#type("text"),
                        placeholder("What needs doing?"),
                        value(&self.new_task),
                        on_input(|event| Msg::SetNewTask(event.value())),
                        on_keypress(|event| {
                            if event.key() == "Enter" {
                                Msg::AddTodo
                            } else {
                                Msg::NoOp
                            }
                        }),
                        class("flex-1 px-3 py-2 bg-ctp-surface0 border border-ctp-surface2 rounded-md focus:outline-none focus:ring-2 focus:ring-ctp-blue"),
                    ],
                    [],
                ),
                button(
                    [
                        on_click(|_| Msg::AddTodo),
                        r#type("button"),
                        class("bg-ctp-blue hover:bg-ctp-sapphire text-ctp-base font-medium px-4 py-2 rounded-md"),
                    ],
                    [text("Add")],
                ),
            ],
        )
    }

    fn view_todo_list(&self) -> Node<Msg> {
        if self.load_error.is_some() {
            return ul(
                [class("space-y-2")],
                [li(
                    [class("load-error text-center py-10 text-ctp-red")],
                    [text(LOAD_ERROR_TEXT)],
                )],
            );
        }
        if self.todos.is_empty() {
            return ul(
                [class("space-y-2")],
                [li(
                    [class("empty text-center py-10 text-ctp-subtext0 italic")],
                    [text(EMPTY_LIST_TEXT)],
                )],
            );
        }
        ul(
            [class("space-y-2")],
            self.todos
                .iter()
                .map(|todo| self.view_todo_row(todo))
                .collect::<Vec<_>>(),
        )
    }

    fn view_todo_row(&self, todo: &Todo) -> Node<Msg> {
        let is_editing = self.editing_todo == Some(todo.id);
        li(
            [
                key(todo.id.to_string()),
                attr("data-id", todo.id.to_string()),
                class(&format!(
                    "flex items-center gap-3 px-4 py-2 rounded-lg border bg-ctp-surface0 {}",
                    if todo.completed {
                        "completed border-ctp-green"
                    } else {
                        "border-ctp-surface1"
                    }
                )),
            ],
            if is_editing {
                // The delete button keeps its spot at the end of the row in
                // both modes.
                vec![
                    input(
                        [
                            r#type("text"),
                            value(&self.edit_text),
                            on_input(|event| Msg::SetEditText(event.value())),
                            class("flex-1 px-2 py-1 bg-ctp-surface1 border border-ctp-surface2 rounded-md focus:outline-none focus:ring-2 focus:ring-ctp-blue"),
                        ],
                        [],
                    ),
                    button(
                        [
                            on_click({
                                let id = todo.id;
                                move |_| Msg::SaveEdit(id)
                            }),
                            r#type("button"),
                            class("bg-ctp-green hover:bg-ctp-teal text-ctp-base px-3 py-1 rounded-md"),
                        ],
                        [text("Save")],
                    ),
                    button(
                        [
                            on_click(|_| Msg::CancelEdit),
                            r#type("button"),
                            class("bg-ctp-overlay0 hover:bg-ctp-overlay1 px-3 py-1 rounded-md"),
                        ],
                        [text("Cancel")],
                    ),
                    self.view_delete_button(todo.id),
                ]
            } else {
                vec![
                    input(
                        [
                            r#type("checkbox"),
                            checked(todo.completed),
                            on_click({
                                let id = todo.id;
                                move |_| Msg::ToggleCompleted(id)
                            }),
                            class("w-4 h-4 cursor-pointer"),
                        ],
                        [],
                    ),
                    span(
                        [class(&format!(
                            "flex-1 {}",
                            if todo.completed {
                                "line-through text-ctp-overlay1"
                            } else {
                                "text-ctp-text"
                            }
                        ))],
                        [text(&todo.task)],
                    ),
                    button(
                        [
                            on_click({
                                let id = todo.id;
                                move |_| Msg::StartEdit(id)
                            }),
                            r#type("button"),
                            class("bg-ctp-blue/20 text-ctp-blue hover:bg-ctp-blue/30 px-3 py-1 rounded-md"),
                        ],
                        [text("Edit")],
                    ),
                    self.view_delete_button(todo.id),
                ]
            },
        )
    }

    fn view_delete_button(&self, id: u64) -> Node<Msg> {
        button(
            [
                on_click(move |event| {
                    // Row-level handlers must not see this click.
                    event.stop_propagation();
                    Msg::DeleteTodo(id)
                }),
                r#type("button"),
                class("delete-btn bg-ctp-red/20 text-ctp-red hover:bg-ctp-red/30 px-3 py-1 rounded-md"),
            ],
            [text("Delete")],
        )
    }
}

/// Trimmed view of the add-form input, `None` when nothing is left.
fn trimmed_non_empty(input: &str) -> Option<&str> {
    let trimmed = input.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// What saving an edit-mode row should do. `None` means the edit is a no-op
/// (empty or unchanged after trimming) and no request is sent.
fn edit_outcome(original: &str, input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed == original {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn load_todos_cmd() -> Cmd<Msg> {
    Cmd::new(async {
        match fetch_todos().await {
            Ok(todos) => Msg::TodosLoaded(todos),
            Err(e) => Msg::LoadFailed(e),
        }
    })
}

async fn fetch_todos() -> Result<Vec<Todo>, String> {
    let response = send_request("GET", &format!("{API_BASE_URL}/todos"), None).await?;

    let text_promise = response.text().map_err(|_| "Failed to read response")?;
    let text = JsFuture::from(text_promise)
        .await
        .map_err(|_| "Failed to get text")?
        .as_string()
        .ok_or("Failed to convert to string")?;

    serde_json::from_str(&text).map_err(|e| format!("Failed to parse JSON: {e}"))
}

async fn create_todo(task: String) -> Result<(), String> {
    let body = serde_json::to_string(&CreateTodoRequest { task })
        .map_err(|_| "Failed to serialize request")?;
    send_request("POST", &format!("{API_BASE_URL}/todos"), Some(body)).await?;
    Ok(())
}

async fn update_todo(id: u64, patch: UpdateTodoRequest) -> Result<(), String> {
    let body = serde_json::to_string(&patch).map_err(|_| "Failed to serialize request")?;
    send_request("PUT", &format!("{API_BASE_URL}/todos/{id}"), Some(body)).await?;
    Ok(())
}

async fn delete_todo(id: u64) -> Result<(), String> {
    send_request("DELETE", &format!("{API_BASE_URL}/todos/{id}"), None).await?;
    Ok(())
}

/// One round trip against the todo service. A network failure and a non-2xx
/// status collapse into the same `Err` arm.
async fn send_request(method: &str, url: &str, body: Option<String>) -> Result<Response, String> {
    let opts = RequestInit::new();
    opts.set_method(method);
    opts.set_mode(RequestMode::Cors);
    if let Some(body) = &body {
        opts.set_body(&wasm_bindgen::JsValue::from_str(body));
    }

    let request =
        Request::new_with_str_and_init(url, &opts).map_err(|_| "Failed to create request")?;

    if body.is_some() {
        request
            .headers()
            .set("Content-Type", "application/json")
            .map_err(|_| "Failed to set header")?;
    }

    let promise = web_sys::window()
        .ok_or("no window")?
        .fetch_with_request(&request);

    let response: Response = JsFuture::from(promise)
        .await
        .map_err(|_| "Failed to reach server")?
        .into();

    if !response.ok() {
        return Err(format!("server returned status {}", response.status()));
    }

    Ok(response)
}

fn alert(message: &str) {
    #[cfg(target_arch = "wasm32")]
    if let Some(window) = web_sys::window() {
        let _ = window.alert_with_message(message);
    }
    #[cfg(not(target_arch = "wasm32"))]
    let _ = message;
}

fn log_error(message: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::error_1(&message.into());
    #[cfg(not(target_arch = "wasm32"))]
    eprintln!("{message}");
}

#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    Program::mount_to_body(Model::default());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_todo(id: u64, task: &str, completed: bool) -> Todo {
        Todo {
            id,
            task: task.to_string(),
            completed,
        }
    }

    fn loaded_model(todos: Vec<Todo>) -> Model {
        let mut model = Model::default();
        let _ = model.update(Msg::TodosLoaded(todos));
        model
    }

    fn render(model: &Model) -> String {
        model.view().render_to_string()
    }

    #[test]
    fn add_input_requires_non_empty_text() {
        assert_eq!(trimmed_non_empty(""), None);
        assert_eq!(trimmed_non_empty("   "), None);
        assert_eq!(trimmed_non_empty(" Walk dog "), Some("Walk dog"));
    }

    #[test]
    fn edit_outcome_skips_empty_and_unchanged_input() {
        assert_eq!(edit_outcome("Buy milk", "Buy milk"), None);
        assert_eq!(edit_outcome("Buy milk", "  Buy milk "), None);
        assert_eq!(edit_outcome("Buy milk", "   "), None);
        assert_eq!(edit_outcome("Buy milk", ""), None);
    }

    #[test]
    fn edit_outcome_trims_changed_input() {
        assert_eq!(
            edit_outcome("Buy milk", " Buy oat milk "),
            Some("Buy oat milk".to_string())
        );
    }

    #[test]
    fn rendered_rows_match_loaded_todos() {
        let model = loaded_model(vec![
            make_todo(1, "Buy milk", false),
            make_todo(2, "Walk dog", true),
            make_todo(3, "Write report", false),
        ]);
        let html = render(&model);
        assert_eq!(html.matches("data-id").count(), 3);
        assert!(html.contains("Buy milk"));
        assert!(html.contains("Walk dog"));
        assert!(html.contains("Write report"));
        assert!(!html.contains(EMPTY_LIST_TEXT));
    }

    #[test]
    fn empty_list_renders_single_placeholder() {
        let html = render(&loaded_model(Vec::new()));
        assert!(html.contains(EMPTY_LIST_TEXT));
        assert_eq!(html.matches("data-id").count(), 0);
    }

    #[test]
    fn completed_row_carries_completed_marker() {
        let html = render(&loaded_model(vec![make_todo(1, "Buy milk", true)]));
        assert!(html.contains("completed"));

        let html = render(&loaded_model(vec![make_todo(1, "Buy milk", false)]));
        assert!(!html.contains("completed"));
    }

    #[test]
    fn failed_load_renders_error_placeholder() {
        let mut model = Model::default();
        let _ = model.update(Msg::LoadFailed("connection refused".to_string()));
        let html = render(&model);
        assert!(html.contains(LOAD_ERROR_TEXT));
        assert_eq!(html.matches("data-id").count(), 0);
    }

    #[test]
    fn reload_replaces_previous_list() {
        let mut model = loaded_model(vec![make_todo(1, "Buy milk", false)]);
        let _ = model.update(Msg::TodosLoaded(vec![make_todo(2, "Walk dog", true)]));
        assert_eq!(model.todos.len(), 1);
        assert_eq!(model.todos[0].id, 2);
    }

    #[test]
    fn successful_reload_clears_previous_error() {
        let mut model = Model::default();
        let _ = model.update(Msg::LoadFailed("connection refused".to_string()));
        let _ = model.update(Msg::TodosLoaded(vec![make_todo(1, "Buy milk", false)]));
        assert!(model.load_error.is_none());
        assert!(!render(&model).contains(LOAD_ERROR_TEXT));
    }

    #[test]
    fn start_edit_prefills_current_text() {
        let mut model = loaded_model(vec![make_todo(1, "Buy milk", false)]);
        let _ = model.update(Msg::StartEdit(1));
        assert_eq!(model.editing_todo, Some(1));
        assert_eq!(model.edit_text, "Buy milk");
    }

    #[test]
    fn start_edit_for_unknown_id_is_ignored() {
        let mut model = loaded_model(vec![make_todo(1, "Buy milk", false)]);
        let _ = model.update(Msg::StartEdit(99));
        assert_eq!(model.editing_todo, None);
    }

    #[test]
    fn edit_mode_renders_input_with_save_and_cancel() {
        let mut model = loaded_model(vec![make_todo(1, "Buy milk", false)]);
        let _ = model.update(Msg::StartEdit(1));
        let html = render(&model);
        assert!(html.contains("Save"));
        assert!(html.contains("Cancel"));
        assert!(html.contains("Delete"));
    }

    #[test]
    fn cancel_edit_restores_original_text() {
        let mut model = loaded_model(vec![make_todo(1, "Buy milk", false)]);
        let _ = model.update(Msg::StartEdit(1));
        let _ = model.update(Msg::SetEditText("Buy oat milk".to_string()));
        let _ = model.update(Msg::CancelEdit);
        assert_eq!(model.editing_todo, None);
        let html = render(&model);
        assert!(html.contains("Buy milk"));
        assert!(!html.contains("Buy oat milk"));
    }

    #[test]
    fn saving_unchanged_text_reverts_to_display_mode() {
        let mut model = loaded_model(vec![make_todo(1, "Buy milk", false)]);
        let _ = model.update(Msg::StartEdit(1));
        let _ = model.update(Msg::SetEditText("  Buy milk  ".to_string()));
        let _ = model.update(Msg::SaveEdit(1));
        assert_eq!(model.editing_todo, None);
        assert!(render(&model).contains("Buy milk"));
    }

    #[test]
    fn save_for_a_row_not_in_edit_mode_is_ignored() {
        let mut model = loaded_model(vec![make_todo(1, "Buy milk", false)]);
        let _ = model.update(Msg::SaveEdit(1));
        assert_eq!(model.editing_todo, None);
        assert_eq!(model.todos[0].task, "Buy milk");
    }

    #[test]
    fn add_with_whitespace_input_preserves_input() {
        let mut model = loaded_model(Vec::new());
        let _ = model.update(Msg::SetNewTask("   ".to_string()));
        let _ = model.update(Msg::AddTodo);
        assert_eq!(model.new_task, "   ");
    }

    #[test]
    fn successful_add_clears_input() {
        let mut model = Model::default();
        let _ = model.update(Msg::SetNewTask("Walk dog".to_string()));
        let _ = model.update(Msg::TodoAdded);
        assert_eq!(model.new_task, "");
    }

    #[test]
    fn toggle_for_unknown_id_is_ignored() {
        let mut model = loaded_model(vec![make_todo(1, "Buy milk", false)]);
        let _ = model.update(Msg::ToggleCompleted(99));
        assert!(!model.todos[0].completed);
    }
}
