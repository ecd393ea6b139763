pub mod channel_id;
