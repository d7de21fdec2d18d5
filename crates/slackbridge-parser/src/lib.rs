pub mod blocks;
pub mod content;
pub mod diff;
pub mod directory;
pub mod error;
pub mod files;
pub mod markup;
pub mod memory;
pub mod mrkdwn;
pub mod parser;
pub mod refs;
pub mod slack;

pub use content::{MessageContent, MsgType, Relation, RenderedMessage};
pub use directory::{
    ChannelNames, EventStore, FileFetcher, IdentityDirectory, LookupResult, Profile, RoomDirectory,
};
pub use error::{LookupError, ParseError};
pub use memory::StaticDirectory;
pub use parser::MessageParser;
pub use slack::SlackApiClient;
