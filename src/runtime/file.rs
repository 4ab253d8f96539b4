use crate::values::Record;
use indexmap::IndexMap;
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum FileMode {
    #[strum(serialize = "INPUT")]
    Input,
    #[strum(serialize = "OUTPUT")]
    Output,
    /// High-speed printer: an append-only log of formatted lines.
    #[strum(serialize = "HSP")]
    Hsp,
}

/// A named record stream. INPUT files carry a read cursor and an
/// end-of-data flag; OUTPUT files only ever append.
#[derive(Debug, Clone)]
pub struct File {
    pub alias: String,
    /// Logical name from the program's declaration; the alias doubles as
    /// the name until the declaration executes.
    pub name: String,
    pub mode: FileMode,
    records: Vec<Record>,
    cursor: usize,
    current: Option<Record>,
    end_of_data: bool,
    closed: bool,
}

impl File {
    fn new(alias: &str, name: &str, mode: FileMode) -> Self {
        File {
            alias: alias.to_string(),
            name: name.to_string(),
            mode,
            records: Vec::new(),
            cursor: 0,
            current: None,
            end_of_data: false,
            closed: false,
        }
    }

    /// Advances the cursor by one. On an empty or exhausted file the
    /// end-of-data flag goes up and the current record stays what it was.
    pub fn read_next(&mut self) -> bool {
        match self.records.get(self.cursor) {
            Some(record) => {
                self.current = Some(record.clone());
                self.cursor += 1;
                self.end_of_data = false;
                true
            }
            None => {
                self.end_of_data = true;
                false
            }
        }
    }

    /// The most recently read record, if any READ-ITEM has succeeded.
    pub fn current(&self) -> Option<&Record> {
        self.current.as_ref()
    }

    pub fn append(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn end_of_data(&self) -> bool {
        self.end_of_data
    }

    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

/// All files known to one interpreter, keyed by alias in declaration order.
#[derive(Debug, Clone, Default)]
pub struct FileTable {
    files: IndexMap<String, File>,
}

impl FileTable {
    /// Registers host-provided INPUT records ahead of the run. The
    /// program's own INPUT declaration later binds the logical name.
    pub fn load_input(&mut self, alias: &str, records: Vec<Record>) {
        let file = self
            .files
            .entry(alias.to_string())
            .or_insert_with(|| File::new(alias, alias, FileMode::Input));
        file.records = records;
        file.cursor = 0;
        file.current = None;
        file.end_of_data = false;
    }

    /// Executes a declaration statement: creates the file if the host has
    /// not loaded it, and binds logical name and mode.
    pub fn declare(&mut self, alias: &str, name: &str, mode: FileMode) {
        let file = self
            .files
            .entry(alias.to_string())
            .or_insert_with(|| File::new(alias, name, mode));
        file.name = name.to_string();
        file.mode = mode;
    }

    pub fn get(&self, alias: &str) -> Option<&File> {
        self.files.get(alias)
    }

    pub fn get_mut(&mut self, alias: &str) -> Option<&mut File> {
        self.files.get_mut(alias)
    }

    pub fn iter(&self) -> impl Iterator<Item = &File> {
        self.files.values()
    }
}
