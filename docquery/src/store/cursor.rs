use crate::collection::Document;
use crate::errors::QueryResult;

type DocumentIter = Box<dyn Iterator<Item = QueryResult<Document>> + Send>;

/// Lazy iteration over the documents a find returned.
///
/// The cursor is only valid for the query that produced it; a store may
/// compute further batches while it is consumed.
pub struct DocumentCursor {
    inner: DocumentIter,
}

impl DocumentCursor {
    pub fn new<I>(iter: I) -> Self
    where
        I: Iterator<Item = QueryResult<Document>> + Send + 'static,
    {
        DocumentCursor {
            inner: Box::new(iter),
        }
    }

    pub fn from_documents(documents: Vec<Document>) -> Self {
        DocumentCursor::new(documents.into_iter().map(Ok))
    }

    pub fn empty() -> Self {
        DocumentCursor::new(std::iter::empty())
    }

    /// First document, or `None` when nothing matched.
    pub fn first(mut self) -> QueryResult<Option<Document>> {
        self.inner.next().transpose()
    }

    pub fn to_list(self) -> QueryResult<Vec<Document>> {
        self.inner.collect()
    }

    /// Consumes the cursor and counts the remaining documents.
    pub fn count(self) -> QueryResult<u64> {
        let mut count = 0u64;
        for document in self.inner {
            document?;
            count += 1;
        }
        Ok(count)
    }
}

impl Iterator for DocumentCursor {
    type Item = QueryResult<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}
