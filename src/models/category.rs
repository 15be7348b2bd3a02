//! The closed set of record categories mirrored from WaniKani.

use std::fmt;

/// One of the three record kinds tracked independently for sync purposes.
///
/// Each category owns one local table and one collection endpoint. The sync
/// order in [`Category::ALL`] is fixed so repeated runs produce reproducible
/// logs; the categories themselves are independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Reviews,
    Subjects,
    Assignments,
}

impl Category {
    /// Fixed sync order: reviews, subjects, assignments.
    pub const ALL: [Category; 3] = [Category::Reviews, Category::Subjects, Category::Assignments];

    /// Name of the local cache table for this category.
    pub fn table(self) -> &'static str {
        match self {
            Category::Reviews => "reviews",
            Category::Subjects => "subjects",
            Category::Assignments => "assignments",
        }
    }

    /// Path segment of the collection endpoint on the remote API.
    /// Happens to match the table name on WaniKani v2, but the two are
    /// separate concerns.
    pub fn endpoint(self) -> &'static str {
        self.table()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

// ============================================================================
// Tests
// ============================================================================
