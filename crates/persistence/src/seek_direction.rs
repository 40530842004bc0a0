/// Represents the direction when searching from the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SeekDirection {
    /// Indicates that the search should be performed in ascending order.
    #[default]
    Forward,
    /// Indicates that the search should be performed in descending order.
    Backward,
}
