pub mod blocks;
pub mod codec;
pub mod composer;
pub mod output;
