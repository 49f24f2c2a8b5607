use std::path::{Path, PathBuf};

/// A resolved binary invocation, ready to hand to the sandbox.
#[derive(Clone, Debug)]
pub struct CommandTuple {
    pub binary_path: PathBuf,
    pub args: Vec<String>,
}

/// Languages accepted by submission intake.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Language {
    C,
    Cpp,
    Python3,
}

impl Language {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "c" => Some(Language::C),
            "cpp" => Some(Language::Cpp),
            "python3" => Some(Language::Python3),
            _ => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Python3 => "python3",
        }
    }

    pub fn source_file(&self) -> &'static str {
        match self {
            Language::C => "main.c",
            Language::Cpp => "main.cpp",
            Language::Python3 => "main.py",
        }
    }

    /// Compiler invocation producing `main` in `dir`, or `None` for
    /// interpreted languages.
    pub fn compile_command(&self, dir: &Path) -> Option<CommandTuple> {
        let (binary, std_flag) = match self {
            Language::C => ("gcc", "-std=c17"),
            Language::Cpp => ("g++", "-std=c++17"),
            Language::Python3 => return None,
        };

        Some(CommandTuple {
            binary_path: binary.into(),
            args: vec![
                "-O2".into(),
                std_flag.into(),
                "-DONLINE_JUDGE".into(),
                "-lm".into(),
                "-o".into(),
                dir.join("main").to_string_lossy().into_owned(),
                dir.join(self.source_file()).to_string_lossy().into_owned(),
            ],
        })
    }

    pub fn run_command(&self, dir: &Path) -> CommandTuple {
        match self {
            Language::C | Language::Cpp => CommandTuple {
                binary_path: dir.join("main"),
                args: vec![],
            },
            Language::Python3 => CommandTuple {
                binary_path: "python3".into(),
                args: vec![dir.join(self.source_file()).to_string_lossy().into_owned()],
            },
        }
    }
}
