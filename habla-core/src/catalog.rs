use crate::types::ModelDescriptor;

/// Models offered by the hosted service. Cloud identifiers carry a `-cloud` tag suffix.
pub const CLOUD_MODELS: &[(&str, &str)] = &[
    (
        "deepseek-v3.1:671b-cloud",
        "671B parameters - Excellent multilingual support (RECOMMENDED)",
    ),
    (
        "gpt-oss:120b-cloud",
        "120B parameters - GPT-style open source model",
    ),
    ("gpt-oss:20b-cloud", "20B parameters - Smaller GPT-style model"),
    (
        "qwen3-coder:480b-cloud",
        "480B parameters - Specialized for coding",
    ),
];

pub fn cloud_models() -> Vec<ModelDescriptor> {
    CLOUD_MODELS
        .iter()
        .map(|(name, description)| ModelDescriptor {
            name: (*name).to_string(),
            description: (*description).to_string(),
        })
        .collect()
}

pub fn cloud_model_names() -> impl Iterator<Item = &'static str> {
    CLOUD_MODELS.iter().map(|(name, _)| *name)
}

pub fn is_cloud_model(name: &str) -> bool {
    cloud_model_names().any(|n| n == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_stable() {
        let models = cloud_models();
        assert_eq!(models.len(), 4);
        assert_eq!(models[0].name, "deepseek-v3.1:671b-cloud");
        assert!(is_cloud_model("gpt-oss:20b-cloud"));
        assert!(!is_cloud_model("llama3:8b"));
    }
}
