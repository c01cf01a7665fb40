use burn::{
    nn::{Dropout, DropoutConfig, Linear, LinearConfig},
    prelude::*,
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally, do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct IntentModelConfig {
    /// Size of the bag-of-words input (tokenizer vocabulary size)
    pub vocab_size: usize,
    /// One output logit per intent category
    pub num_labels: usize,
    #[config(default = 64)]
    pub hidden_size: usize,
    #[config(default = 0.3)]
    pub dropout: f64,
}

impl IntentModelConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> IntentModel<B> {
        IntentModel {
            hidden:  LinearConfig::new(self.vocab_size, self.hidden_size).init(device),
            output:  LinearConfig::new(self.hidden_size, self.num_labels).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
        }
    }
}

/// Bag-of-words → hidden ReLU layer → independent per-category logits.
#[derive(Module, Debug)]
pub struct IntentModel<B: Backend> {
    pub hidden:  Linear<B>,
    pub output:  Linear<B>,
    pub dropout: Dropout,
}

impl<B: Backend> IntentModel<B> {
    /// features: [batch, vocab_size] → logits: [batch, num_labels]
    pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.dropout.forward(features);
        let x = burn::tensor::activation::relu(self.hidden.forward(x));
        let x = self.dropout.forward(x);
        self.output.forward(x)
    }

    /// Per-category probabilities in [0, 1]. Not a softmax: categories
    /// are independent, so the row need not sum to 1.
    pub fn forward_scores(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        burn::tensor::activation::sigmoid(self.forward(features))
    }

    /// Mean sigmoid binary cross-entropy against dense targets in [0, 1].
    pub fn forward_loss(&self, features: Tensor<B, 2>, targets: Tensor<B, 2>) -> Tensor<B, 1> {
        bce_with_logits(self.forward(features), targets)
    }
}

/// Numerically stable BCE on logits:
///   max(z, 0) - z*y + ln(1 + e^(-|z|))
/// averaged over every element.
pub fn bce_with_logits<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 2>) -> Tensor<B, 1> {
    let positive = logits.clone().clamp_min(0.0);
    let cross    = logits.clone().mul(targets);
    let softplus = logits.abs().neg().exp().log1p();
    positive.sub(cross).add(softplus).mean()
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type B = NdArray;

    #[test]
    fn test_output_shape_and_range() {
        let device = Default::default();
        let model: IntentModel<B> = IntentModelConfig::new(10, 3).init(&device);
        let x      = Tensor::<B, 2>::ones([4, 10], &device);
        let scores = model.forward_scores(x);
        assert_eq!(scores.dims(), [4, 3]);

        let values = scores.into_data().convert::<f32>().to_vec::<f32>().unwrap();
        assert!(values.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_bce_with_logits_matches_closed_form() {
        let device  = Default::default();
        let logits  = Tensor::<B, 2>::from_data(TensorData::new(vec![0.0f32, 2.0], [1, 2]), &device);
        let targets = Tensor::<B, 2>::from_data(TensorData::new(vec![1.0f32, 0.0], [1, 2]), &device);
        let loss: f64 = bce_with_logits(logits, targets).into_scalar().elem::<f64>();

        // -ln(sigmoid(0)) = ln 2 ; -ln(1 - sigmoid(2)) = ln(1 + e^2)
        let expected = (2f64.ln() + (1.0 + 2f64.exp()).ln()) / 2.0;
        assert!((loss - expected).abs() < 1e-4);
    }
}
