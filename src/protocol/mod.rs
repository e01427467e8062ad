//! Protocol-level types: field identifiers, the header container, message
//! framing summaries, and the error taxonomy.

mod message;
pub use message::BodyPart;
pub use message::Framing;
pub use message::MessageKind;
pub use message::Status;
pub use message::Version;

mod field_id;
pub use field_id::FieldId;

mod fields;
pub use fields::Field;
pub use fields::Fields;
pub use fields::Iter;
pub use fields::Key;
pub use fields::Matching;
pub(crate) use fields::{Entry, Span};

mod error;
pub use error::FieldError;
pub use error::ParseError;
