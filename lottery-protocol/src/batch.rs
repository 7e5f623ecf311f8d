//! Batching of bet records into bounded chunks.
//!
//! Each record is suffixed with `,<client id>` and records are joined with
//! `\n`. A chunk never holds more than `max_batch_size` records and only the
//! last chunk of a source may hold fewer.

/// One batch of records, ready to be framed and sent as a single message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    payload: String,
    records: usize,
}

impl Chunk {
    /// The newline-joined records.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.payload.as_bytes()
    }

    /// Number of records in this chunk.
    pub fn record_count(&self) -> usize {
        self.records
    }

    /// Iterates over the tagged records of this chunk.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.payload.split('\n')
    }
}

/// Lazily partitions a record source into chunks.
pub struct Batcher<I> {
    records: I,
    max_batch_size: usize,
    client_id: String,
}

impl<I> Batcher<I>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
    /// Creates a batcher. A `max_batch_size` of zero behaves as one.
    pub fn new<R>(records: R, max_batch_size: usize, client_id: impl Into<String>) -> Self
    where
        R: IntoIterator<IntoIter = I>,
    {
        Self {
            records: records.into_iter(),
            max_batch_size: max_batch_size.max(1),
            client_id: client_id.into(),
        }
    }
}

impl<I> Iterator for Batcher<I>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        let mut payload = String::new();
        let mut records = 0;

        while records < self.max_batch_size {
            let Some(record) = self.records.next() else {
                break;
            };
            if records > 0 {
                payload.push('\n');
            }
            payload.push_str(record.as_ref());
            payload.push(',');
            payload.push_str(&self.client_id);
            records += 1;
        }

        (records > 0).then_some(Chunk { payload, records })
    }
}

/// Eagerly partitions `records` into chunks of at most `max_batch_size`.
pub fn split_into_chunks<R>(records: R, max_batch_size: usize, client_id: &str) -> Vec<Chunk>
where
    R: IntoIterator,
    R::Item: AsRef<str>,
{
    Batcher::new(records, max_batch_size, client_id).collect()
}
