pub mod message_builder;
pub mod record_type_map;
pub mod response;
pub mod synthesizer;

pub use message_builder::MessageBuilder;
pub use record_type_map::RecordTypeMapper;
pub use response::{decay_ttls, is_negative, min_answer_ttl, serialize_message};
pub use synthesizer::Synthesizer;
