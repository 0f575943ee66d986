/// Specifies the direction for sorting documents.
///
/// Used with [crate::collection::FindOptions::sort_by] and [crate::collection::order_by].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Smallest to largest
    Ascending,
    /// Largest to smallest
    Descending,
}
