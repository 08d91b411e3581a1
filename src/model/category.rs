use crate::error::Res;
use anyhow::bail;
use serde::{Deserialize, Serialize};

/// The fixed set of spending categories a transaction can be filed under.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum Category {
    Food,
    Transport,
    Entertainment,
    Bills,
    Shopping,
    Other,
}

serde_plain::derive_display_from_serialize!(Category);
serde_plain::derive_fromstr_from_deserialize!(Category);

impl Category {
    /// Every category, in the order they are offered on the entry form.
    pub const ALL: [Category; 6] = [
        Category::Food,
        Category::Transport,
        Category::Entertainment,
        Category::Bills,
        Category::Shopping,
        Category::Other,
    ];

    /// Parses user input into a `Category`. Matching ignores case and surrounding whitespace but
    /// is otherwise exact: `"food"` is `Food`, `"Groceries"` is an error.
    pub fn parse(input: impl AsRef<str>) -> Res<Self> {
        let input = input.as_ref().trim();
        match Self::ALL
            .iter()
            .find(|c| c.to_string().eq_ignore_ascii_case(input))
        {
            Some(category) => Ok(*category),
            None => bail!(
                "'{input}' is not a category, expected one of: {}",
                Self::ALL
                    .iter()
                    .map(|c| c.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
}
