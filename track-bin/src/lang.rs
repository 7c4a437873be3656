use track::builtins::Language;

/// Builtin tables selectable from the command line.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Lang {
    Minimal,
    #[default]
    BeginningStudent,
}

impl From<Lang> for Language {
    fn from(value: Lang) -> Self {
        match value {
            Lang::Minimal => Language::Minimal,
            Lang::BeginningStudent => Language::BeginningStudent,
        }
    }
}

impl std::fmt::Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lang::Minimal => f.write_str("minimal"),
            Lang::BeginningStudent => f.write_str("beginning-student"),
        }
    }
}
