pub mod images;

pub use images::DiskImageStore;
