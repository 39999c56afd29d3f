pub mod json_gallery_store;
pub mod onnx_descriptor_extractor;
pub mod onnx_landmark_extractor;
pub mod preprocess;
