pub mod execution_provider;
pub mod model_resolver;
pub mod onnx_arcface_embedder;
pub mod onnx_yolo_detector;
