//! Message text and inline keyboards
//!
//! Everything here is pure. Views that use markup are written in
//! MarkdownV2 and pass every piece of static and user text through
//! `escape_markdown_v2`; the rest are sent as plain text.

use crate::bot::PickKind;
use crate::store::Todo;

const CHECKED: &str = "✅";
const UNCHECKED: &str = "⬜️";

/// Button actions, carried as callback data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    List,
    Add,
    Complete,
    Delete,
}

impl Action {
    pub fn callback_data(self) -> &'static str {
        match self {
            Action::List => "list",
            Action::Add => "add",
            Action::Complete => "complete",
            Action::Delete => "delete",
        }
    }

    pub fn from_callback_data(data: &str) -> Option<Self> {
        match data {
            "list" => Some(Action::List),
            "add" => Some(Action::Add),
            "complete" => Some(Action::Complete),
            "delete" => Some(Action::Delete),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub action: Action,
}

impl Button {
    pub fn new(label: &str, action: Action) -> Self {
        Self {
            label: label.to_string(),
            action,
        }
    }
}

/// Inline keyboard, row by row
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    /// Keyboard with a single row
    pub fn row(buttons: Vec<Button>) -> Self {
        Self {
            rows: vec![buttons],
        }
    }

    pub fn single(label: &str, action: Action) -> Self {
        Self::row(vec![Button::new(label, action)])
    }

    #[allow(dead_code)] // Used in tests
    pub fn actions(&self) -> Vec<Action> {
        self.rows.iter().flatten().map(|b| b.action).collect()
    }
}

/// Markup dialect of a view's text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Plain,
    #[allow(dead_code)] // Legacy dialect; the transport accepts it but no view uses it
    Markdown,
    MarkdownV2,
}

/// A rendered message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub text: String,
    pub parse_mode: ParseMode,
    pub keyboard: Option<Keyboard>,
}

impl View {
    fn plain(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            text: text.into(),
            parse_mode: ParseMode::Plain,
            keyboard: Some(keyboard),
        }
    }

    fn markdown(text: String, keyboard: Keyboard) -> Self {
        Self {
            text,
            parse_mode: ParseMode::MarkdownV2,
            keyboard: Some(keyboard),
        }
    }
}

/// Which list screen to render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMode {
    /// Browsing, with the full action bar
    Browse,
    /// Waiting for the user to type an id, with only a back button
    Pick(PickKind),
}

// ============================================================================
// Markup helpers
// ============================================================================

pub fn escape_markdown_v2(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 8);
    for ch in raw.chars() {
        if matches!(
            ch,
            '_' | '*'
                | '['
                | ']'
                | '('
                | ')'
                | '~'
                | '`'
                | '>'
                | '#'
                | '+'
                | '-'
                | '='
                | '|'
                | '{'
                | '}'
                | '.'
                | '!'
                | '\\'
        ) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

fn bold(raw: &str) -> String {
    format!("*{}*", escape_markdown_v2(raw))
}

fn back_to_list() -> Keyboard {
    Keyboard::single("🔙 Back to List", Action::List)
}

fn view_list() -> Keyboard {
    Keyboard::single("📋 View Todo List", Action::List)
}

fn open_list() -> Keyboard {
    Keyboard::single("📋 Open Todo List", Action::List)
}

// ============================================================================
// Views
// ============================================================================

pub fn welcome() -> View {
    let text = [
        format!("🤖 {} 📝", bold("Welcome to Todo Bot!")),
        String::new(),
        escape_markdown_v2("I can help you manage your tasks efficiently."),
        String::new(),
        bold("Use the buttons below to:"),
        "📋 View your todo list".to_string(),
        "➕ Add new tasks".to_string(),
        "✅ Mark tasks as complete/incomplete".to_string(),
        "🗑️ Delete tasks".to_string(),
        String::new(),
        escape_markdown_v2("Let's get organized! Tap a button below to begin."),
    ]
    .join("\n");

    View::markdown(
        text,
        Keyboard::row(vec![
            Button::new("📋 List", Action::List),
            Button::new("➕ Add", Action::Add),
        ]),
    )
}

/// The user's list, or the empty-list view when there is nothing to show
pub fn render_list(todos: &[Todo], mode: ListMode) -> View {
    if todos.is_empty() {
        let text = format!(
            "📋 {}\n\n{}",
            bold("Your Todo List is Empty"),
            escape_markdown_v2("You have no todos yet. Add your first task!")
        );
        return View::markdown(text, Keyboard::single("➕ Add Todo", Action::Add));
    }

    let mut text = match mode {
        ListMode::Browse => format!("📋 {}\n\n", bold("Your Todo List:")),
        ListMode::Pick(kind) => {
            let (title, instruction) = match kind {
                PickKind::Complete => (
                    "✅ Enter Todo Number to Toggle",
                    "Type the number of the todo you want to mark as complete/incomplete.",
                ),
                PickKind::Delete => (
                    "🗑️ Enter Todo Number to Delete",
                    "Type the number of the todo you want to delete.",
                ),
            };
            format!(
                "{}\n\n{}\n\n{}\n",
                bold(title),
                escape_markdown_v2(instruction),
                bold("Your Todos:")
            )
        }
    };

    for todo in todos {
        text.push_str(&todo_line(todo));
        text.push('\n');
    }

    let keyboard = match mode {
        ListMode::Browse => Keyboard::row(vec![
            Button::new("➕ Add", Action::Add),
            Button::new("✅ Complete", Action::Complete),
            Button::new("🗑️ Delete", Action::Delete),
        ]),
        ListMode::Pick(_) => back_to_list(),
    };
    View::markdown(text, keyboard)
}

/// `<glyph> *<id>*: <text>`
fn todo_line(todo: &Todo) -> String {
    let glyph = if todo.completed { CHECKED } else { UNCHECKED };
    format!(
        "{glyph} {}: {}",
        bold(&todo.id.to_string()),
        escape_markdown_v2(&todo.text)
    )
}

pub fn add_prompt() -> View {
    View::plain(
        "Please send me the task you want to add.\n\nJust type your todo text as a reply to this message.",
        back_to_list(),
    )
}

/// Toast shown when a pick flow is started with an empty list
pub fn nothing_to(kind: PickKind) -> String {
    match kind {
        PickKind::Complete => "You have no todos to complete!".to_string(),
        PickKind::Delete => "You have no todos to delete!".to_string(),
    }
}

pub fn added(text: &str) -> View {
    View::plain(format!("✅ Added new todo: {text}"), view_list())
}

pub fn toggled(id: i64, completed: bool) -> View {
    let status = if completed {
        "completed"
    } else {
        "marked as pending"
    };
    View::plain(format!("✅ Todo {id} {status}."), view_list())
}

pub fn deleted(text: &str) -> View {
    View::plain(format!("🗑️ Deleted todo: {text}"), view_list())
}

pub fn not_found(id: i64) -> View {
    View::plain(format!("❌ Todo with ID {id} not found."), back_to_list())
}

pub fn invalid_number() -> View {
    View::plain("❌ Please enter a valid number.", back_to_list())
}

pub fn store_failure() -> View {
    View::plain(
        "⚠️ Sorry, I couldn't reach your todo list right now. Please try again in a moment.",
        open_list(),
    )
}

pub fn command_hint() -> View {
    View::plain(
        "✨ I now work with buttons instead of commands! ✨\n\nTap the button below to access your todo list.",
        open_list(),
    )
}

pub fn text_hint() -> View {
    View::plain(
        "To manage your todos, please use the buttons provided. Tap below to get started:",
        open_list(),
    )
}
