use std::io::Read;

use csv::{StringRecordsIntoIter, Trim};

/// One row of the replay file: a function name followed by its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub function: String,
    pub args: Vec<String>,
}

/// Parses invocations in CSV format.
///
/// Rows may have any number of columns; `#` starts a comment line.
pub struct CsvInvocationParser<R> {
    iter: StringRecordsIntoIter<R>,
}

impl<R> CsvInvocationParser<R>
where
    R: Read,
{
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .comment(Some(b'#'))
            .from_reader(source);

        Self {
            iter: reader.into_records(),
        }
    }
}

impl<R> Iterator for CsvInvocationParser<R>
where
    R: Read,
{
    type Item = csv::Result<(u64, Invocation)>;

    fn next(&mut self) -> Option<Self::Item> {
        let curr_line = self.iter.reader().position().line();
        self.iter.next().map(|row| {
            let row = row?;
            let line = row.position().map_or(curr_line, |pos| pos.line());
            let mut fields = row.iter().map(ToOwned::to_owned);
            let function = fields.next().unwrap_or_default();
            Ok((
                line,
                Invocation {
                    function,
                    args: fields.collect(),
                },
            ))
        })
    }
}
