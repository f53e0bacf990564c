use super::AnalysisKind;

pub enum Action {
    Analyze(AnalysisKind, String),
    Bootstrap(),
    DeleteMessage(usize),
    DeleteSession(Option<String>),
    EditMessage(usize, String),
    ListModels(),
    ListSessions(),
    NewSession(),
    Regenerate(Option<usize>),
    RenameSession(Option<String>, String),
    SaveDraft(String),
    SelectSession(String),
    SubmitDraft(),
    SubmitPrompt(String),
    SyncSession(String),
}
