/// All possible semantic actions in taskboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // Navigation
    FocusPrevColumn,
    FocusNextColumn,
    SelectPrev,
    SelectNext,

    // Task movement
    MoveTaskPrevColumn,
    MoveTaskNextColumn,
    MoveTaskUp,
    MoveTaskDown,
    MoveToColumn,

    // Task actions
    NewTask,
    EditTask,
    DeleteTask,
    Undo,

    // Board
    NewColumn,
    Reload,
    Back,

    // Dashboard
    OpenBoard,
    NewBoard,
    DeleteBoard,
    OpenProfile,
    Logout,

    // Profile
    EditProfile,

    // Forms
    FormNext,
    FormPrev,
    FormSubmit,
    FormCancel,
    SwitchAuthForm,

    // Text input
    InputConfirm,
    InputCancel,
    InputChar(char),
    InputBackspace,
    InputLeft,
    InputRight,
    InputHome,
    InputEnd,
    InputDeleteWord,

    // Confirmation
    Confirm,
    Deny,

    ShowHelp,
    EnterSpaceMode,
    Quit,
    ForceQuit,

    // No-op
    None,
}
