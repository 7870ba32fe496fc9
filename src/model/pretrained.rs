//! ImageNet initialisation from a torchvision `resnet18` state dict.
//!
//! Accepts the PyTorch pickle (`.pth`) torchvision ships, or the same tensors
//! exported as `.safetensors`. Key names follow torchvision in both cases.

use std::path::Path;

use burn::tensor::backend::Backend;
use burn_store::{ModuleSnapshot, PyTorchToBurnAdapter, PytorchStore, SafetensorsStore};
use tracing::info;

use super::resnet::ResNet18;
use crate::utils::error::{ClassifierError, Result};

/// Head width of the ImageNet checkpoint
pub const IMAGENET_CLASSES: usize = 1000;

/// torchvision key pattern -> field path of [`super::resnet::Downsample`]
pub const DOWNSAMPLE_KEY_REMAP: [(&str, &str); 2] = [
    (r"downsample\.0\.", "downsample.conv."),
    (r"downsample\.1\.", "downsample.bn."),
];

/// Load ImageNet weights and attach a fresh `num_classes`-way head.
///
/// Every backbone tensor must be present; a partial state dict is an error.
pub fn load_pretrained<B: Backend>(
    path: &Path,
    num_classes: usize,
    device: &B::Device,
) -> Result<ResNet18<B>> {
    if !path.is_file() {
        return Err(ClassifierError::PathNotFound(path.to_path_buf()));
    }
    info!("Loading ImageNet weights from {:?}", path);

    let mut model = ResNet18::<B>::new(IMAGENET_CLASSES, device);
    let is_safetensors = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("safetensors"));

    let loaded = if is_safetensors {
        let mut store = DOWNSAMPLE_KEY_REMAP.iter().fold(
            SafetensorsStore::from_file(path).with_from_adapter(PyTorchToBurnAdapter),
            |store, (from, to)| store.with_key_remapping(*from, *to),
        );
        model.load_from(&mut store).map(|_| ()).map_err(|e| format!("{:?}", e))
    } else {
        let mut store = DOWNSAMPLE_KEY_REMAP.iter().fold(
            PytorchStore::from_file(path),
            |store, (from, to)| store.with_key_remapping(*from, *to),
        );
        model.load_from(&mut store).map(|_| ()).map_err(|e| format!("{:?}", e))
    };
    loaded.map_err(|e| ClassifierError::Model(format!("Failed to load {:?}: {}", path, e)))?;

    Ok(model.with_classifier(num_classes, device))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DefaultBackend;
    use burn_store::BurnToPyTorchAdapter;
    use tempfile::TempDir;

    type TestBackend = DefaultBackend;

    fn weights(tensor: burn::tensor::Tensor<TestBackend, 4>) -> Vec<f32> {
        tensor.into_data().to_vec().unwrap()
    }

    #[test]
    fn test_missing_weights_file() {
        let device = Default::default();
        let result =
            load_pretrained::<TestBackend>(Path::new("/nonexistent/resnet18.pth"), 6, &device);
        assert!(matches!(result, Err(ClassifierError::PathNotFound(_))));
    }

    #[test]
    fn test_torchvision_state_dict_fills_downsample_fields() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("resnet18.safetensors");
        let device = Default::default();

        // Write the backbone under torchvision names: `downsample.0` / `downsample.1`
        let source = ResNet18::<TestBackend>::new(IMAGENET_CLASSES, &device);
        let mut store = SafetensorsStore::from_file(&path)
            .with_to_adapter(BurnToPyTorchAdapter)
            .with_key_remapping(r"downsample\.conv\.", "downsample.0.")
            .with_key_remapping(r"downsample\.bn\.", "downsample.1.");
        source.save_into(&mut store).unwrap();

        let model = load_pretrained::<TestBackend>(&path, 6, &device).unwrap();
        assert_eq!(model.num_classes(), 6);

        for (layer_src, layer_dst) in [
            (&source.layer2, &model.layer2),
            (&source.layer3, &model.layer3),
            (&source.layer4, &model.layer4),
        ] {
            let expected = layer_src[0].downsample.as_ref().unwrap();
            let actual = layer_dst[0].downsample.as_ref().unwrap();
            assert_eq!(
                weights(actual.conv.weight.val()),
                weights(expected.conv.weight.val())
            );
            let gamma_src: Vec<f32> = expected.bn.gamma.val().into_data().to_vec().unwrap();
            let gamma_dst: Vec<f32> = actual.bn.gamma.val().into_data().to_vec().unwrap();
            assert_eq!(gamma_dst, gamma_src);
        }

        assert_eq!(
            weights(model.conv1.weight.val()),
            weights(source.conv1.weight.val())
        );
    }
}
