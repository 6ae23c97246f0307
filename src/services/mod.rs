pub mod asset_uploader;
pub mod question_store;
pub mod review_writer;

pub use asset_uploader::AssetUploader;
pub use question_store::QuestionStore;
pub use review_writer::ReviewWriter;
