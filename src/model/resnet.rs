//! ResNet-18 backbone with a replaceable classification head
//!
//! Field names follow the torchvision layout (`conv1`, `bn1`, `layer1`..`layer4`,
//! `fc`) so an ImageNet state dict maps onto the module tree with only the
//! `downsample` submodule renamed.

use burn::{
    config::Config,
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig},
        BatchNorm, BatchNormConfig, Linear, LinearConfig, PaddingConfig2d, Relu,
    },
    tensor::{backend::Backend, Tensor},
};

/// Width of the pooled feature vector feeding the head
pub const FEATURE_DIM: usize = 512;

/// Configuration for [`ResNet18`]
#[derive(Config, Debug)]
pub struct ResNet18Config {
    /// Number of output classes
    #[config(default = "6")]
    pub num_classes: usize,
}

impl ResNet18Config {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ResNet18<B> {
        ResNet18::new(self.num_classes, device)
    }
}

/// 1x1 projection used when a block changes resolution or width
#[derive(Module, Debug)]
pub struct Downsample<B: Backend> {
    pub conv: Conv2d<B>,
    pub bn: BatchNorm<B>,
}

/// Two 3x3 convolutions with an identity (or projected) shortcut
#[derive(Module, Debug)]
pub struct BasicBlock<B: Backend> {
    pub conv1: Conv2d<B>,
    pub bn1: BatchNorm<B>,
    pub relu: Relu,
    pub conv2: Conv2d<B>,
    pub bn2: BatchNorm<B>,
    pub downsample: Option<Downsample<B>>,
}

impl<B: Backend> BasicBlock<B> {
    pub fn new(in_channels: usize, out_channels: usize, stride: usize, device: &B::Device) -> Self {
        let conv1 = Conv2dConfig::new([in_channels, out_channels], [3, 3])
            .with_stride([stride, stride])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .with_bias(false)
            .init(device);
        let conv2 = Conv2dConfig::new([out_channels, out_channels], [3, 3])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .with_bias(false)
            .init(device);

        let downsample = (stride != 1 || in_channels != out_channels).then(|| Downsample {
            conv: Conv2dConfig::new([in_channels, out_channels], [1, 1])
                .with_stride([stride, stride])
                .with_bias(false)
                .init(device),
            bn: BatchNormConfig::new(out_channels).init(device),
        });

        Self {
            conv1,
            bn1: BatchNormConfig::new(out_channels).init(device),
            relu: Relu::new(),
            conv2,
            bn2: BatchNormConfig::new(out_channels).init(device),
            downsample,
        }
    }

    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let identity = match &self.downsample {
            Some(down) => down.bn.forward(down.conv.forward(input.clone())),
            None => input.clone(),
        };

        let x = self.conv1.forward(input);
        let x = self.bn1.forward(x);
        let x = self.relu.forward(x);
        let x = self.conv2.forward(x);
        let x = self.bn2.forward(x);

        self.relu.forward(x + identity)
    }
}

/// ResNet-18
///
/// - Stem: 7x7/2 conv, BN, ReLU, 3x3/2 max-pool
/// - Four stages of two basic blocks (64, 128, 256, 512 channels)
/// - Global average pooling + linear head
#[derive(Module, Debug)]
pub struct ResNet18<B: Backend> {
    pub conv1: Conv2d<B>,
    pub bn1: BatchNorm<B>,
    pub relu: Relu,
    pub maxpool: MaxPool2d,
    pub layer1: Vec<BasicBlock<B>>,
    pub layer2: Vec<BasicBlock<B>>,
    pub layer3: Vec<BasicBlock<B>>,
    pub layer4: Vec<BasicBlock<B>>,
    pub avgpool: AdaptiveAvgPool2d,
    pub fc: Linear<B>,
}

impl<B: Backend> ResNet18<B> {
    pub fn new(num_classes: usize, device: &B::Device) -> Self {
        let conv1 = Conv2dConfig::new([3, 64], [7, 7])
            .with_stride([2, 2])
            .with_padding(PaddingConfig2d::Explicit(3, 3))
            .with_bias(false)
            .init(device);

        let maxpool = MaxPool2dConfig::new([3, 3])
            .with_strides([2, 2])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init();

        let stage = |in_ch: usize, out_ch: usize, stride: usize| {
            vec![
                BasicBlock::new(in_ch, out_ch, stride, device),
                BasicBlock::new(out_ch, out_ch, 1, device),
            ]
        };

        Self {
            conv1,
            bn1: BatchNormConfig::new(64).init(device),
            relu: Relu::new(),
            maxpool,
            layer1: stage(64, 64, 1),
            layer2: stage(64, 128, 2),
            layer3: stage(128, 256, 2),
            layer4: stage(256, FEATURE_DIM, 2),
            avgpool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            fc: LinearConfig::new(FEATURE_DIM, num_classes).init(device),
        }
    }

    /// Swap the head for a freshly initialised `Linear(512, num_classes)`
    pub fn with_classifier(mut self, num_classes: usize, device: &B::Device) -> Self {
        self.fc = LinearConfig::new(FEATURE_DIM, num_classes).init(device);
        self
    }

    /// Output width of the head, read from its weights
    pub fn num_classes(&self) -> usize {
        self.fc.weight.val().dims()[1]
    }

    /// Logits `[batch_size, num_classes]` for input `[batch_size, 3, H, W]`
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.conv1.forward(input);
        let x = self.bn1.forward(x);
        let x = self.relu.forward(x);
        let mut x = self.maxpool.forward(x);

        for block in self
            .layer1
            .iter()
            .chain(&self.layer2)
            .chain(&self.layer3)
            .chain(&self.layer4)
        {
            x = block.forward(x);
        }

        let x = self.avgpool.forward(x);
        let [batch_size, channels, _, _] = x.dims();
        let x = x.reshape([batch_size, channels]);

        self.fc.forward(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DefaultBackend;

    type TestBackend = DefaultBackend;

    #[test]
    fn test_resnet18_output_width_is_six() {
        let device = Default::default();
        let model = ResNet18Config::new().init::<TestBackend>(&device);

        let input = Tensor::<TestBackend, 4>::zeros([2, 3, 64, 64], &device);
        let output = model.forward(input);

        assert_eq!(output.dims(), [2, 6]);
        assert_eq!(model.num_classes(), 6);
    }

    #[test]
    fn test_with_classifier_replaces_head() {
        let device = Default::default();
        let model = ResNet18::<TestBackend>::new(1000, &device).with_classifier(2, &device);

        let input = Tensor::<TestBackend, 4>::zeros([1, 3, 32, 32], &device);
        assert_eq!(model.forward(input).dims(), [1, 2]);
        assert_eq!(model.num_classes(), 2);
    }

    #[test]
    fn test_downsample_only_where_shape_changes() {
        let device = Default::default();
        let model = ResNet18::<TestBackend>::new(6, &device);

        assert!(model.layer1.iter().all(|b| b.downsample.is_none()));
        assert!(model.layer2[0].downsample.is_some());
        assert!(model.layer2[1].downsample.is_none());
        assert!(model.layer4[0].downsample.is_some());
    }
}
