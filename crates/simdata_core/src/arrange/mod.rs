//! Arrangement of record sections into analysis-ready tables.
//!
//! The entry points are methods on [`OutputRecord`](crate::model::OutputRecord):
//!
//! - `combine_variables` merges per-type variable tables under an `obj_type` level
//! - `combine_parameters` merges the parameter sample with broadcast constants
//! - `arrange` joins variables, reporters and parameters into one table
//!
//! ```ignore
//! use simdata_core::arrange::ArrangeOptions;
//!
//! let table = record
//!     .arrange(&ArrangeOptions::new().reporters(true).parameters(true))?
//!     .expect("record has reporters");
//! ```

mod combine;

/// Which entries of a section to include
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    /// Nothing
    #[default]
    None,
    /// Everything available
    All,
    /// Only the named keys
    Keys(Vec<String>),
}

impl Selection {
    pub fn is_none(&self) -> bool {
        matches!(self, Selection::None)
    }

    /// Whether `key` is selected
    pub fn contains(&self, key: &str) -> bool {
        match self {
            Selection::None => false,
            Selection::All => true,
            Selection::Keys(keys) => keys.iter().any(|k| k == key),
        }
    }
}

impl From<bool> for Selection {
    fn from(all: bool) -> Self {
        if all { Selection::All } else { Selection::None }
    }
}

impl From<&str> for Selection {
    fn from(key: &str) -> Self {
        Selection::Keys(vec![key.to_string()])
    }
}

impl From<Vec<&str>> for Selection {
    fn from(keys: Vec<&str>) -> Self {
        Selection::Keys(keys.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for Selection {
    fn from(keys: Vec<String>) -> Self {
        Selection::Keys(keys)
    }
}

/// Arguments of [`OutputRecord::arrange`](crate::model::OutputRecord::arrange)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrangeOptions {
    pub variables: Selection,
    pub reporters: Selection,
    /// `All` selects only the varying parameters; a key list may also name
    /// constants.
    pub parameters: Selection,
    pub obj_types: Selection,
    /// Keep the multi-level index instead of flattening it into columns
    pub index: bool,
}

impl Default for ArrangeOptions {
    fn default() -> Self {
        Self {
            variables: Selection::None,
            reporters: Selection::None,
            parameters: Selection::None,
            obj_types: Selection::All,
            index: false,
        }
    }
}

impl ArrangeOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn variables(mut self, selection: impl Into<Selection>) -> Self {
        self.variables = selection.into();
        self
    }

    pub fn reporters(mut self, selection: impl Into<Selection>) -> Self {
        self.reporters = selection.into();
        self
    }

    pub fn parameters(mut self, selection: impl Into<Selection>) -> Self {
        self.parameters = selection.into();
        self
    }

    pub fn obj_types(mut self, selection: impl Into<Selection>) -> Self {
        self.obj_types = selection.into();
        self
    }

    pub fn keep_index(mut self, index: bool) -> Self {
        self.index = index;
        self
    }
}
