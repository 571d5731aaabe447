//! Index level vocabulary shared by every recorded table

/// Identifiers a recorded table may be indexed by, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexLevel {
    SampleId,
    Iteration,
    ObjId,
    T,
}

impl IndexLevel {
    pub const ALL: [IndexLevel; 4] = [
        IndexLevel::SampleId,
        IndexLevel::Iteration,
        IndexLevel::ObjId,
        IndexLevel::T,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            IndexLevel::SampleId => "sample_id",
            IndexLevel::Iteration => "iteration",
            IndexLevel::ObjId => "obj_id",
            IndexLevel::T => "t",
        }
    }

    /// Vocabulary names found among `columns`, in canonical order
    pub fn present_in<'a, I>(columns: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a String> + Clone,
    {
        Self::ALL
            .iter()
            .map(|level| level.name())
            .filter(|name| columns.clone().into_iter().any(|c| c == name))
            .map(str::to_string)
            .collect()
    }
}

/// Outermost level added when per-type variable tables are concatenated
pub const OBJ_TYPE: &str = "obj_type";
