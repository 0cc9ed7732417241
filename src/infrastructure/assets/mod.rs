//! Derived-asset blob storage.

mod fs_blob_store;

pub use fs_blob_store::FsAssetBlobStore;
