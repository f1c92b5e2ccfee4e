pub mod download;
pub mod ocr;
pub mod pages;
pub mod process;
