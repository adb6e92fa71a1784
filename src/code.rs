//! The shared code editor document and its languages.

use std::fmt;
use std::str::FromStr;

use frames::{Body, Envelope};

use crate::sync::SharedDocument;

/// Editor language, identified on the execution service by its Judge0 id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    #[default]
    Python,
    Java,
    JavaScript,
    Cpp,
    C,
    Kotlin,
    Go,
    TypeScript,
    Php,
    Ruby,
    Swift,
    Scala,
    Bash,
    R,
    ObjectiveC,
    Rust,
    Dart,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown language: {0}")]
pub struct UnknownLanguage(pub String);

impl Language {
    pub const ALL: [Self; 17] = [
        Self::Python,
        Self::Java,
        Self::JavaScript,
        Self::Cpp,
        Self::C,
        Self::Kotlin,
        Self::Go,
        Self::TypeScript,
        Self::Php,
        Self::Ruby,
        Self::Swift,
        Self::Scala,
        Self::Bash,
        Self::R,
        Self::ObjectiveC,
        Self::Rust,
        Self::Dart,
    ];

    #[must_use]
    pub fn judge0_id(self) -> u32 {
        match self {
            Self::Python => 71,
            Self::Java => 62,
            Self::JavaScript => 63,
            Self::Cpp => 54,
            Self::C => 50,
            Self::Kotlin => 73,
            Self::Go => 65,
            Self::TypeScript => 78,
            Self::Php => 68,
            Self::Ruby => 76,
            Self::Swift => 85,
            Self::Scala => 86,
            Self::Bash => 47,
            Self::R => 91,
            Self::ObjectiveC => 80,
            Self::Rust => 77,
            Self::Dart => 83,
        }
    }

    #[must_use]
    pub fn from_judge0_id(id: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|lang| lang.judge0_id() == id)
    }

    /// Editor mode name, e.g. `"cpp"` or `"objective-c"`.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Java => "java",
            Self::JavaScript => "javascript",
            Self::Cpp => "cpp",
            Self::C => "c",
            Self::Kotlin => "kotlin",
            Self::Go => "go",
            Self::TypeScript => "typescript",
            Self::Php => "php",
            Self::Ruby => "ruby",
            Self::Swift => "swift",
            Self::Scala => "scala",
            Self::Bash => "bash",
            Self::R => "r",
            Self::ObjectiveC => "objective-c",
            Self::Rust => "rust",
            Self::Dart => "dart",
        }
    }

    /// "Hello, World!" starter program.
    #[must_use]
    pub fn template(self) -> &'static str {
        match self {
            Self::Python => "print('Hello, World!')",
            Self::Java => {
                "public class Main {\n    public static void main(String[] args) {\n        System.out.println(\"Hello, World!\");\n    }\n}"
            }
            Self::JavaScript | Self::TypeScript => "console.log('Hello, World!');",
            Self::Cpp => "#include <iostream>\nint main() {\n    std::cout << \"Hello, World!\" << std::endl;\n    return 0;\n}",
            Self::C => "#include <stdio.h>\nint main() {\n    printf(\"Hello, World!\\n\");\n    return 0;\n}",
            Self::Kotlin => "fun main() {\n    println(\"Hello, World!\")\n}",
            Self::Go => "package main\nimport \"fmt\"\nfunc main() {\n    fmt.Println(\"Hello, World!\")\n}",
            Self::Php => "<?php\necho \"Hello, World!\\n\";\n?>",
            Self::Ruby => "puts \"Hello, World!\"",
            Self::Swift => "import Swift\nprint(\"Hello, World!\")",
            Self::Scala => "object Main extends App {\n    println(\"Hello, World!\")\n}",
            Self::Bash => "#!/bin/bash\necho \"Hello, World!\"",
            Self::R => "print(\"Hello, World!\")",
            Self::ObjectiveC => {
                "#import <Foundation/Foundation.h>\nint main(int argc, const char * argv[]) {\n    @autoreleasepool {\n        NSLog(@\"Hello, World!\");\n    }\n    return 0;\n}"
            }
            Self::Rust => "fn main() {\n    println!(\"Hello, World!\");\n}",
            Self::Dart => "void main() {\n    print('Hello, World!');\n}",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = UnknownLanguage;

    /// Accepts the editor name (`"cpp"`) or the Judge0 id (`"54"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|lang| lang.name() == key || lang.judge0_id().to_string() == key)
            .ok_or_else(|| UnknownLanguage(s.to_owned()))
    }
}

/// Local edit to the code document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeEdit {
    /// The editor content changed to this full text.
    Replace(String),
    /// Switch language; the text is reset to the language template locally.
    SetLanguage(Language),
}

/// Shared editor contents. Every inbound `code` envelope replaces the text,
/// including echoes of this peer's own edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeDocument {
    text: String,
    language: Language,
}

impl Default for CodeDocument {
    fn default() -> Self {
        Self::new(Language::default())
    }
}

impl CodeDocument {
    /// Document holding the template for `language`.
    #[must_use]
    pub fn new(language: Language) -> Self {
        Self { text: language.template().to_owned(), language }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn language(&self) -> Language {
        self.language
    }
}

impl SharedDocument for CodeDocument {
    type Edit = CodeEdit;

    fn apply_local(&mut self, edit: CodeEdit) -> Option<Body> {
        match edit {
            CodeEdit::Replace(text) => {
                if text == self.text {
                    return None;
                }
                self.text.clone_from(&text);
                Some(Body::Code(text))
            }
            CodeEdit::SetLanguage(language) => {
                self.language = language;
                language.template().clone_into(&mut self.text);
                None
            }
        }
    }

    fn apply_remote(&mut self, envelope: &Envelope) -> bool {
        let Body::Code(text) = &envelope.body else {
            return false;
        };
        self.text.clone_from(text);
        true
    }
}

#[cfg(test)]
#[path = "code_test.rs"]
mod tests;
