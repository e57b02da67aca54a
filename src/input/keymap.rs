use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::action::Action;
use crate::app::Mode;
use crate::session::Route;

/// Map a key event to a semantic action based on current screen and mode.
pub fn map_key(key: KeyEvent, route: Route, mode: &Mode) -> Action {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Action::ForceQuit;
    }
    match mode {
        Mode::Form(_) => map_form(key),
        Mode::Input { .. } => map_input(key),
        Mode::Confirm { .. } => map_confirm(key),
        Mode::Picker { .. } => map_picker(key),
        Mode::Space => map_space(key),
        Mode::Help => match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => Action::Quit,
            _ => Action::None,
        },
        Mode::Normal => match route {
            Route::Dashboard => map_dashboard(key),
            Route::Board(_) => map_board(key),
            Route::Profile => map_profile(key),
            Route::Login | Route::Register => Action::None,
        },
    }
}

fn map_dashboard(key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => Action::SelectNext,
        KeyCode::Char('k') | KeyCode::Up => Action::SelectPrev,
        KeyCode::Enter => Action::OpenBoard,
        KeyCode::Char('n') => Action::NewBoard,
        KeyCode::Char('d') => Action::DeleteBoard,
        KeyCode::Char('p') => Action::OpenProfile,
        KeyCode::Char('L') => Action::Logout,
        KeyCode::Char('r') => Action::Reload,
        KeyCode::Char('?') => Action::ShowHelp,
        KeyCode::Char('q') => Action::Quit,
        _ => Action::None,
    }
}

fn map_board(key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Char('z') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::Undo,
        KeyCode::Char('h') | KeyCode::Left => Action::FocusPrevColumn,
        KeyCode::Char('l') | KeyCode::Right => Action::FocusNextColumn,
        KeyCode::Char('j') | KeyCode::Down => Action::SelectNext,
        KeyCode::Char('k') | KeyCode::Up => Action::SelectPrev,
        KeyCode::Char('H') => Action::MoveTaskPrevColumn,
        KeyCode::Char('L') => Action::MoveTaskNextColumn,
        KeyCode::Char('J') => Action::MoveTaskDown,
        KeyCode::Char('K') => Action::MoveTaskUp,
        KeyCode::Char('n') => Action::NewTask,
        KeyCode::Enter | KeyCode::Char('e') => Action::EditTask,
        KeyCode::Char('d') => Action::DeleteTask,
        KeyCode::Char('u') => Action::Undo,
        KeyCode::Char('r') => Action::Reload,
        KeyCode::Char(' ') => Action::EnterSpaceMode,
        KeyCode::Char('?') => Action::ShowHelp,
        KeyCode::Esc | KeyCode::Char('q') => Action::Back,
        _ => Action::None,
    }
}

fn map_space(key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Char('n') => Action::NewTask,
        KeyCode::Char('e') => Action::EditTask,
        KeyCode::Char('d') => Action::DeleteTask,
        KeyCode::Char('m') => Action::MoveToColumn,
        KeyCode::Char('c') => Action::NewColumn,
        KeyCode::Char('u') => Action::Undo,
        KeyCode::Char('r') => Action::Reload,
        KeyCode::Char('?') => Action::ShowHelp,
        _ => Action::None,
    }
}

fn map_profile(key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Char('e') => Action::EditProfile,
        KeyCode::Char('r') => Action::Reload,
        KeyCode::Char('?') => Action::ShowHelp,
        KeyCode::Esc | KeyCode::Char('q') => Action::Back,
        _ => Action::None,
    }
}

fn map_form(key: KeyEvent) -> Action {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Enter => Action::FormSubmit,
        KeyCode::Esc => Action::FormCancel,
        KeyCode::Tab | KeyCode::Down => Action::FormNext,
        KeyCode::BackTab | KeyCode::Up => Action::FormPrev,
        KeyCode::Char('r') if ctrl => Action::SwitchAuthForm,
        KeyCode::Char('a') if ctrl => Action::InputHome,
        KeyCode::Char('e') if ctrl => Action::InputEnd,
        KeyCode::Char('w') if ctrl => Action::InputDeleteWord,
        KeyCode::Char(c) => Action::InputChar(c),
        KeyCode::Backspace => Action::InputBackspace,
        KeyCode::Left => Action::InputLeft,
        KeyCode::Right => Action::InputRight,
        KeyCode::Home => Action::InputHome,
        KeyCode::End => Action::InputEnd,
        _ => Action::None,
    }
}

fn map_input(key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Enter => Action::InputConfirm,
        KeyCode::Esc => Action::InputCancel,
        KeyCode::Char('a') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::InputHome,
        KeyCode::Char('e') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::InputEnd,
        KeyCode::Char('w') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Action::InputDeleteWord
        }
        KeyCode::Char(c) => Action::InputChar(c),
        KeyCode::Backspace => Action::InputBackspace,
        KeyCode::Left => Action::InputLeft,
        KeyCode::Right => Action::InputRight,
        KeyCode::Home => Action::InputHome,
        KeyCode::End => Action::InputEnd,
        _ => Action::None,
    }
}

fn map_confirm(key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Char('y') | KeyCode::Enter => Action::Confirm,
        KeyCode::Char('n') | KeyCode::Esc => Action::Deny,
        _ => Action::None,
    }
}

fn map_picker(key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => Action::SelectNext,
        KeyCode::Char('k') | KeyCode::Up => Action::SelectPrev,
        KeyCode::Enter => Action::InputConfirm,
        KeyCode::Esc | KeyCode::Char('q') => Action::InputCancel,
        _ => Action::None,
    }
}

// ---------------------------------------------------------------------------
// Binding registry: what the help overlay, status hints and the Space popup
// display. Keep in step with the `map_*` functions above.
// ---------------------------------------------------------------------------

/// A documented keybinding.
pub struct Binding {
    pub key: &'static str,
    pub description: &'static str,
}

/// A group of related bindings (one section in help).
pub struct BindingGroup {
    pub name: &'static str,
    pub bindings: &'static [Binding],
}

pub const DASHBOARD_BINDINGS: &[Binding] = &[
    Binding { key: "j / k", description: "Select board" },
    Binding { key: "Enter", description: "Open board" },
    Binding { key: "n", description: "New board" },
    Binding { key: "d", description: "Delete board" },
    Binding { key: "p", description: "Profile" },
    Binding { key: "r", description: "Reload" },
    Binding { key: "L", description: "Log out" },
    Binding { key: "q", description: "Quit" },
];

pub const BOARD_BINDINGS: &[Binding] = &[
    Binding { key: "h / l", description: "Switch columns" },
    Binding { key: "j / k", description: "Move between tasks" },
    Binding { key: "H / L", description: "Move task left/right" },
    Binding { key: "J / K", description: "Move task down/up" },
    Binding { key: "n", description: "New task" },
    Binding { key: "Enter", description: "Edit task" },
    Binding { key: "d", description: "Delete task" },
    Binding { key: "u", description: "Undo delete" },
    Binding { key: "Space", description: "Commands" },
    Binding { key: "Esc", description: "Back to boards" },
];

pub const SPACE_BINDINGS: &[Binding] = &[
    Binding { key: "n", description: "New task" },
    Binding { key: "e", description: "Edit task" },
    Binding { key: "d", description: "Delete task" },
    Binding { key: "m", description: "Move to column" },
    Binding { key: "c", description: "New column" },
    Binding { key: "u", description: "Undo delete" },
    Binding { key: "r", description: "Reload board" },
    Binding { key: "?", description: "Help" },
];

pub const PROFILE_BINDINGS: &[Binding] = &[
    Binding { key: "e", description: "Edit profile" },
    Binding { key: "r", description: "Reload" },
    Binding { key: "Esc", description: "Back to boards" },
];

pub const FORM_BINDINGS: &[Binding] = &[
    Binding { key: "Tab / S-Tab", description: "Next/prev field" },
    Binding { key: "Space / ← →", description: "Change choice" },
    Binding { key: "Enter", description: "Submit" },
    Binding { key: "Esc", description: "Cancel" },
    Binding { key: "C-r", description: "Log in / register" },
];

/// All binding groups for the help overlay.
pub const HELP_GROUPS: &[BindingGroup] = &[
    BindingGroup { name: "Boards", bindings: DASHBOARD_BINDINGS },
    BindingGroup { name: "Board", bindings: BOARD_BINDINGS },
    BindingGroup { name: "Commands (Space)", bindings: SPACE_BINDINGS },
    BindingGroup { name: "Profile", bindings: PROFILE_BINDINGS },
    BindingGroup { name: "Forms", bindings: FORM_BINDINGS },
];

/// Get bindings for a minor mode (for popup and status display).
pub fn mode_bindings(mode: &Mode) -> &'static [Binding] {
    match mode {
        Mode::Space => SPACE_BINDINGS,
        Mode::Form(_) => FORM_BINDINGS,
        _ => &[],
    }
}

/// Bindings for a screen in normal mode.
pub fn route_bindings(route: Route) -> &'static [Binding] {
    match route {
        Route::Dashboard => DASHBOARD_BINDINGS,
        Route::Board(_) => BOARD_BINDINGS,
        Route::Profile => PROFILE_BINDINGS,
        Route::Login | Route::Register => FORM_BINDINGS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::form::{FormState, TextBuffer};
    use crate::app::{ConfirmTarget, InputTarget, PickerTarget};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn key_ctrl(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::CONTROL)
    }

    const BOARD: Route = Route::Board(1);

    fn board(code: KeyCode) -> Action {
        map_key(key(code), BOARD, &Mode::Normal)
    }

    fn form_mode() -> Mode {
        Mode::Form(Box::new(FormState::login()))
    }

    // ── Board bindings ──

    #[test]
    fn board_hjkl_navigates() {
        assert_eq!(board(KeyCode::Char('h')), Action::FocusPrevColumn);
        assert_eq!(board(KeyCode::Right), Action::FocusNextColumn);
        assert_eq!(board(KeyCode::Char('j')), Action::SelectNext);
        assert_eq!(board(KeyCode::Up), Action::SelectPrev);
    }

    #[test]
    fn board_shift_keys_move_task() {
        assert_eq!(board(KeyCode::Char('H')), Action::MoveTaskPrevColumn);
        assert_eq!(board(KeyCode::Char('L')), Action::MoveTaskNextColumn);
        assert_eq!(board(KeyCode::Char('J')), Action::MoveTaskDown);
        assert_eq!(board(KeyCode::Char('K')), Action::MoveTaskUp);
    }

    #[test]
    fn board_undo_keys() {
        assert_eq!(board(KeyCode::Char('u')), Action::Undo);
        assert_eq!(map_key(key_ctrl(KeyCode::Char('z')), BOARD, &Mode::Normal), Action::Undo);
        assert_eq!(map_key(key(KeyCode::Char('u')), BOARD, &Mode::Space), Action::Undo);
    }

    #[test]
    fn undo_is_not_mapped_inside_modals() {
        let input = Mode::Input { prompt: "Column title", buf: TextBuffer::empty(), target: InputTarget::NewColumn };
        assert_eq!(map_key(key(KeyCode::Char('u')), BOARD, &input), Action::InputChar('u'));
        assert_eq!(map_key(key(KeyCode::Char('u')), BOARD, &form_mode()), Action::InputChar('u'));
        let confirm = Mode::Confirm { prompt: "Delete task?", target: ConfirmTarget::DeleteBoard(1) };
        assert_eq!(map_key(key(KeyCode::Char('u')), BOARD, &confirm), Action::None);
        assert_eq!(map_key(key_ctrl(KeyCode::Char('z')), BOARD, &confirm), Action::None);
    }

    #[test]
    fn board_esc_goes_back() {
        assert_eq!(board(KeyCode::Esc), Action::Back);
        assert_eq!(board(KeyCode::Char('q')), Action::Back);
    }

    #[test]
    fn ctrl_c_quits_everywhere() {
        for mode in [Mode::Normal, Mode::Help, form_mode()] {
            assert_eq!(map_key(key_ctrl(KeyCode::Char('c')), BOARD, &mode), Action::ForceQuit);
        }
        assert_eq!(map_key(key_ctrl(KeyCode::Char('c')), Route::Login, &form_mode()), Action::ForceQuit);
    }

    #[test]
    fn space_c_adds_column() {
        assert_eq!(map_key(key(KeyCode::Char('c')), BOARD, &Mode::Space), Action::NewColumn);
        assert_eq!(map_key(key(KeyCode::Char('m')), BOARD, &Mode::Space), Action::MoveToColumn);
        assert_eq!(map_key(key(KeyCode::Esc), BOARD, &Mode::Space), Action::None);
    }

    // ── Dashboard / profile ──

    #[test]
    fn dashboard_bindings() {
        let dash = |code| map_key(key(code), Route::Dashboard, &Mode::Normal);
        assert_eq!(dash(KeyCode::Enter), Action::OpenBoard);
        assert_eq!(dash(KeyCode::Char('n')), Action::NewBoard);
        assert_eq!(dash(KeyCode::Char('d')), Action::DeleteBoard);
        assert_eq!(dash(KeyCode::Char('L')), Action::Logout);
        assert_eq!(dash(KeyCode::Char('q')), Action::Quit);
        assert_eq!(dash(KeyCode::Char('h')), Action::None);
    }

    #[test]
    fn profile_bindings() {
        assert_eq!(map_key(key(KeyCode::Char('e')), Route::Profile, &Mode::Normal), Action::EditProfile);
        assert_eq!(map_key(key(KeyCode::Esc), Route::Profile, &Mode::Normal), Action::Back);
    }

    // ── Forms ──

    #[test]
    fn form_keys() {
        let mode = form_mode();
        assert_eq!(map_key(key(KeyCode::Tab), Route::Login, &mode), Action::FormNext);
        assert_eq!(map_key(key(KeyCode::BackTab), Route::Login, &mode), Action::FormPrev);
        assert_eq!(map_key(key(KeyCode::Enter), Route::Login, &mode), Action::FormSubmit);
        assert_eq!(map_key(key(KeyCode::Esc), Route::Login, &mode), Action::FormCancel);
        assert_eq!(map_key(key_ctrl(KeyCode::Char('r')), Route::Login, &mode), Action::SwitchAuthForm);
        assert_eq!(map_key(key(KeyCode::Char('q')), Route::Login, &mode), Action::InputChar('q'));
        assert_eq!(map_key(key_ctrl(KeyCode::Char('w')), Route::Login, &mode), Action::InputDeleteWord);
    }

    // ── Confirm / picker / help ──

    #[test]
    fn confirm_y_n() {
        let mode = Mode::Confirm { prompt: "Delete task?", target: ConfirmTarget::DeleteTask { column_id: 1, task_id: 2 } };
        assert_eq!(map_key(key(KeyCode::Char('y')), BOARD, &mode), Action::Confirm);
        assert_eq!(map_key(key(KeyCode::Enter), BOARD, &mode), Action::Confirm);
        assert_eq!(map_key(key(KeyCode::Char('n')), BOARD, &mode), Action::Deny);
        assert_eq!(map_key(key(KeyCode::Esc), BOARD, &mode), Action::Deny);
    }

    #[test]
    fn picker_navigates_and_confirms() {
        let mode = Mode::Picker {
            title: "Move to column",
            items: vec![],
            selected: 0,
            target: PickerTarget::MoveToColumn { column_ids: vec![] },
        };
        assert_eq!(map_key(key(KeyCode::Char('j')), BOARD, &mode), Action::SelectNext);
        assert_eq!(map_key(key(KeyCode::Char('k')), BOARD, &mode), Action::SelectPrev);
        assert_eq!(map_key(key(KeyCode::Enter), BOARD, &mode), Action::InputConfirm);
        assert_eq!(map_key(key(KeyCode::Esc), BOARD, &mode), Action::InputCancel);
    }

    #[test]
    fn help_closes() {
        assert_eq!(map_key(key(KeyCode::Char('?')), BOARD, &Mode::Help), Action::Quit);
        assert_eq!(map_key(key(KeyCode::Char('x')), BOARD, &Mode::Help), Action::None);
    }

    // ── Binding registry ──

    #[test]
    fn space_bindings_match_keymap() {
        for binding in SPACE_BINDINGS {
            let c = binding.key.chars().next().unwrap();
            assert_ne!(
                map_key(key(KeyCode::Char(c)), BOARD, &Mode::Space),
                Action::None,
                "space binding {} is documented but unmapped",
                binding.key
            );
        }
    }

    #[test]
    fn mode_bindings_space_returns_bindings() {
        assert!(!mode_bindings(&Mode::Space).is_empty());
        assert!(mode_bindings(&Mode::Normal).is_empty());
    }

    #[test]
    fn every_route_has_bindings() {
        for route in [Route::Login, Route::Dashboard, BOARD, Route::Profile] {
            assert!(!route_bindings(route).is_empty());
        }
    }
}
