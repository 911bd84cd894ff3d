pub mod image;
pub mod package;
pub mod paragraph;
pub mod xml;

pub use image::{ImageFormat, ImageInfo, EMU_PER_INCH};
pub use package::DocxPackage;
pub use paragraph::{Paragraph, Run};
