use serde::Serialize;
use std::collections::HashSet;
use std::error::Error;
use std::fmt;

/// Upper bound on links captured from a `std::error::Error` source chain.
const MAX_CAPTURED_SOURCES: usize = 64;

/// One entry of a stack trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackFrame {
    pub declaring_class: String,
    pub method_name: String,
    pub file_name: Option<String>,
    pub line_number: Option<u32>,
    pub native: bool,
}

impl StackFrame {
    pub fn new(
        declaring_class: impl Into<String>,
        method_name: impl Into<String>,
        file_name: Option<&str>,
        line_number: Option<u32>,
    ) -> Self {
        StackFrame {
            declaring_class: declaring_class.into(),
            method_name: method_name.into(),
            file_name: file_name.map(str::to_string),
            line_number,
            native: false,
        }
    }

    pub fn native(declaring_class: impl Into<String>, method_name: impl Into<String>) -> Self {
        StackFrame {
            declaring_class: declaring_class.into(),
            method_name: method_name.into(),
            file_name: None,
            line_number: None,
            native: true,
        }
    }
}

/// Renders `cls.method(File.java:12)` the way stack trace dumps do.
impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}(", self.declaring_class, self.method_name)?;
        match (&self.file_name, self.line_number) {
            _ if self.native => f.write_str("Native Method")?,
            (Some(file), Some(line)) => write!(f, "{}:{}", file, line)?,
            (Some(file), None) => f.write_str(file)?,
            (None, _) => f.write_str("Unknown Source")?,
        }
        f.write_str(")")
    }
}

/// Identity of a [`Throwable`] inside its [`ThrowableChain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThrowableId(usize);

/// A single error: class name, optional message and its frames.
///
/// `cause` and `suppressed` hold identities into the owning chain, so a
/// throwable may point back at itself or at any ancestor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Throwable {
    pub class_name: String,
    pub message: Option<String>,
    pub frames: Vec<StackFrame>,
    cause: Option<ThrowableId>,
    suppressed: Vec<ThrowableId>,
}

impl Throwable {
    pub fn new(class_name: impl Into<String>, message: Option<&str>) -> Self {
        Throwable {
            class_name: class_name.into(),
            message: message.map(str::to_string),
            frames: Vec::new(),
            cause: None,
            suppressed: Vec::new(),
        }
    }

    pub fn with_frames(mut self, frames: Vec<StackFrame>) -> Self {
        self.frames = frames;
        self
    }
}

/// Header line of a trace dump: `Class: message`, or just `Class`.
impl fmt::Display for Throwable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {}", self.class_name, message),
            None => f.write_str(&self.class_name),
        }
    }
}

/// Arena holding an error, its causes and its suppressed errors.
///
/// The first pushed throwable is the root. Links are set after insertion,
/// which makes self-referential chains expressible; every traversal over a
/// chain must therefore track visited identities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrowableChain {
    nodes: Vec<Throwable>,
}

impl ThrowableChain {
    pub fn new(root: Throwable) -> Self {
        ThrowableChain { nodes: vec![root] }
    }

    pub fn root_id(&self) -> ThrowableId {
        ThrowableId(0)
    }

    pub fn push(&mut self, throwable: Throwable) -> ThrowableId {
        self.nodes.push(throwable);
        ThrowableId(self.nodes.len() - 1)
    }

    /// Link `cause` as the cause of `of`. Unknown identities are ignored.
    pub fn set_cause(&mut self, of: ThrowableId, cause: ThrowableId) {
        if cause.0 >= self.nodes.len() {
            return;
        }
        if let Some(node) = self.nodes.get_mut(of.0) {
            node.cause = Some(cause);
        }
    }

    /// Append `suppressed` to the suppressed list of `to`. Unknown identities
    /// are ignored.
    pub fn add_suppressed(&mut self, to: ThrowableId, suppressed: ThrowableId) {
        if suppressed.0 >= self.nodes.len() {
            return;
        }
        if let Some(node) = self.nodes.get_mut(to.0) {
            node.suppressed.push(suppressed);
        }
    }

    pub fn get(&self, id: ThrowableId) -> Option<ThrowableRef<'_>> {
        self.nodes.get(id.0).map(|throwable| ThrowableRef { chain: self, id, throwable })
    }

    pub fn root(&self) -> Option<ThrowableRef<'_>> {
        self.get(self.root_id())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Capture an error and its `source()` chain.
    ///
    /// Rust errors carry neither class names nor frames, so the class name is
    /// taken from the leading identifier of the `Debug` rendering (the type or
    /// variant name for derived impls) and frames are left empty.
    pub fn from_error(error: &(dyn Error + 'static)) -> Self {
        let mut chain = ThrowableChain::new(capture(error));
        let mut previous = chain.root_id();
        let mut source = error.source();
        while let Some(err) = source {
            if chain.len() >= MAX_CAPTURED_SOURCES {
                break;
            }
            let id = chain.push(capture(err));
            chain.set_cause(previous, id);
            previous = id;
            source = err.source();
        }
        chain
    }
}

fn capture(error: &(dyn Error + 'static)) -> Throwable {
    let debug = format!("{:?}", error);
    let class_name: String = debug
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == ':')
        .collect();
    let class_name = if class_name.is_empty() { "Error".to_string() } else { class_name };
    Throwable::new(class_name, Some(&error.to_string()))
}

/// Borrowed view of one throwable together with its chain, used to follow
/// links without exposing raw identities to callers.
#[derive(Debug, Clone, Copy)]
pub struct ThrowableRef<'a> {
    chain: &'a ThrowableChain,
    id: ThrowableId,
    throwable: &'a Throwable,
}

impl<'a> ThrowableRef<'a> {
    pub fn id(&self) -> ThrowableId {
        self.id
    }

    pub fn throwable(&self) -> &'a Throwable {
        self.throwable
    }

    pub fn class_name(&self) -> &'a str {
        &self.throwable.class_name
    }

    pub fn message(&self) -> Option<&'a str> {
        self.throwable.message.as_deref()
    }

    pub fn frames(&self) -> &'a [StackFrame] {
        &self.throwable.frames
    }

    pub fn cause(&self) -> Option<ThrowableRef<'a>> {
        self.throwable.cause.and_then(|id| self.chain.get(id))
    }

    pub fn suppressed(&self) -> impl Iterator<Item = ThrowableRef<'a>> + 'a {
        let chain = self.chain;
        self.throwable.suppressed.iter().filter_map(move |id| chain.get(*id))
    }

    /// Follow causes until the last one, stopping at the first revisit.
    pub fn root_cause(&self) -> ThrowableRef<'a> {
        let mut visited = HashSet::from([self.id]);
        let mut current = *self;
        while let Some(cause) = current.cause() {
            if !visited.insert(cause.id) {
                break;
            }
            current = cause;
        }
        current
    }
}
