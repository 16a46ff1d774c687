use crate::{
    config::ModelConfig,
    model_service::{ModelService, ModelServiceError},
};
use image::imageops::FilterType;
use ndarray::{Array, Ix4};
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::TensorRef,
};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

/// Spatial resolution the classifier was trained on.
const INPUT_SIZE: usize = 128;

/// Decodes raw upload bytes into the classifier's input tensor: RGB,
/// 128x128, pixel values scaled to [0, 1], NHWC with a batch axis of 1.
pub fn transform_image(image_data: &[u8]) -> Result<Array<f32, Ix4>, ModelServiceError> {
    let image_reader = image::ImageReader::new(std::io::Cursor::new(image_data))
        .with_guessed_format()
        .map_err(|e| ModelServiceError::Decode(e.to_string()))?;

    let original_img = image_reader
        .decode()
        .map_err(|e| ModelServiceError::Decode(e.to_string()))?;

    let img = original_img
        .resize_exact(INPUT_SIZE as u32, INPUT_SIZE as u32, FilterType::CatmullRom)
        .to_rgb8();

    let mut input = Array::zeros((1, INPUT_SIZE, INPUT_SIZE, 3));
    for (x, y, pixel) in img.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        input[[0, y as usize, x as usize, 0]] = (r as f32) / 255.;
        input[[0, y as usize, x as usize, 1]] = (g as f32) / 255.;
        input[[0, y as usize, x as usize, 2]] = (b as f32) / 255.;
    }

    Ok(input)
}

pub struct OrtModelService {
    sessions: Arc<Vec<Arc<Mutex<Session>>>>,
    counter: Arc<AtomicUsize>,
    output_name: String,
}

impl OrtModelService {
    pub fn new(model_config: &ModelConfig) -> Result<Self, Box<dyn std::error::Error>> {
        ort::init().commit()?;

        let model_path = model_config.get_model_path();
        let num_instances = model_config.num_instances;
        let sessions = (0..num_instances)
            .map(|_| {
                let session = Session::builder()?
                    .with_optimization_level(GraphOptimizationLevel::Level3)?
                    .commit_from_file(&model_path)?;
                Ok(session)
            })
            .collect::<Result<Vec<_>, ort::Error>>()?;

        // Converted Keras artifacts do not have a stable output name, so
        // take it from the session metadata instead of hardcoding one.
        let output_name = sessions
            .first()
            .and_then(|session| session.outputs.first())
            .map(|output| output.name.clone())
            .ok_or("model has no outputs")?;

        tracing::info!("Created {} ONNX sessions from {:?}", num_instances, model_path);

        Ok(Self {
            sessions: Arc::new(
                sessions
                    .into_iter()
                    .map(|session| Arc::new(Mutex::new(session)))
                    .collect(),
            ),
            counter: Arc::new(AtomicUsize::new(0)),
            output_name,
        })
    }

    fn run_inference(&self, input: &Array<f32, Ix4>) -> Result<f32, ModelServiceError> {
        let index = self.counter.fetch_add(1, Ordering::SeqCst) % self.sessions.len();
        let session_arc = &self.sessions[index];
        let mut session = session_arc
            .lock()
            .map_err(|e| ModelServiceError::Inference(format!("session mutex poisoned: {}", e)))?;

        tracing::debug!("Handling request with session {}", index);

        let tensor_ref = TensorRef::from_array_view(input.view())
            .map_err(|e| ModelServiceError::Inference(format!("failed to build tensor: {}", e)))?;

        let outputs = session
            .run(ort::inputs![tensor_ref])
            .map_err(|e| ModelServiceError::Inference(e.to_string()))?;

        let (_shape, data) = outputs[self.output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(|e| ModelServiceError::Inference(format!("failed to extract tensor: {}", e)))?;

        data.first()
            .copied()
            .ok_or(ModelServiceError::MissingScalarOutput)
    }
}

impl ModelService for OrtModelService {
    fn predict(&self, image_data: &[u8]) -> Result<f32, ModelServiceError> {
        let input = transform_image(image_data)?;
        self.run_inference(&input)
    }
}
