use keymap::KeyMap;

#[derive(KeyMap, Clone, Copy, Debug, PartialEq)]
pub enum Action {
    /// Quit the application
    #[key("q")]
    Quit,
    /// Zoom in around the centre of the canvas
    #[key("i")]
    ZoomIn,
    /// Zoom out around the centre of the canvas
    #[key("o")]
    ZoomOut,
    /// Reset zoom and scrolling
    #[key("c")]
    ResetView,
    /// Add a state at a free position in the visible area
    #[key("a")]
    AddState,
    /// Select the next transition
    #[key("tab")]
    SelectNext,
    /// Toggle the read symbol of the selected transition
    #[key("r")]
    CycleRead,
    /// Toggle the written symbol of the selected transition
    #[key("w")]
    CycleWrite,
    /// Cycle the head movement of the selected transition
    #[key("m")]
    CycleDirection,
    /// Show the program text of the graph
    #[key("e")]
    Export,
    /// Remove every state and transition
    #[key("x")]
    ResetGraph,
    /// Toggle help display
    #[key("h")]
    ToggleHelp,
    /// Load the previous program
    #[key("left")]
    PreviousProgram,
    /// Load the next program
    #[key("right")]
    NextProgram,
}
