use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Name of a variable in the analyzed program
///
/// Variables are tracked by name: two references with the same spelling denote
/// the same variable, whichever declaration they resolve to.
#[derive(Eq, PartialEq, Ord, PartialOrd, Hash, Clone, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Identifier {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl From<&String> for Identifier {
    fn from(name: &String) -> Self {
        Self(name.clone())
    }
}

impl From<&str> for Identifier {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq<str> for Identifier {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_compare_by_spelling() {
        let name = Identifier::from("count");
        assert_eq!(name, Identifier::from(String::from("count")));
        assert!(name == *"count");
        assert_eq!(name.to_string(), "count");
        assert_eq!(serde_json::to_string(&name).unwrap(), "\"count\"");
    }
}
