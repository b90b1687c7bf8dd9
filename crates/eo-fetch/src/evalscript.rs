//! Evalscript (V3) generation for the requested band set.
//!
//! Each requested band becomes one single-band output so the response
//! archive contains one image per identifier. When reflectance bands are
//! requested as digital numbers, the script also emits the per-scene
//! normalization factor through the user-data side channel.

use crate::request::BandClass;

/// Generate a V3 evalscript for the given `(band, class)` set.
pub fn generate(bands: &[(String, BandClass)], record_norm_factor: bool) -> String {
    let names: Vec<String> = bands
        .iter()
        .map(|(name, _)| format!("\"{name}\""))
        .collect();
    let units: Vec<String> = bands
        .iter()
        .map(|(_, class)| format!("\"{}\"", class.unit))
        .collect();
    let outputs: Vec<String> = bands
        .iter()
        .map(|(name, class)| {
            format!(
                "            {{id: \"{name}\", bands: 1, sampleType: \"{}\"}}",
                class.sample_type
            )
        })
        .collect();
    let returns: Vec<String> = bands
        .iter()
        .map(|(name, _)| format!("        {name}: [samples.{name}]"))
        .collect();

    let metadata = if record_norm_factor {
        "\nfunction updateOutputMetadata(scenes, inputMetadata, outputMetadata) {\n    \
         outputMetadata.userData = { \"norm_factor\": inputMetadata.normalizationFactor }\n}\n"
    } else {
        ""
    };

    format!(
        "//VERSION=3\n\n\
         function setup() {{\n    \
         return {{\n        \
         input: [{{\n            \
         bands: [{bands}],\n            \
         units: [{units}]\n        \
         }}],\n        \
         output: [\n{outputs}\n        ]\n    \
         }}\n}}\n{metadata}\n\
         function evaluatePixel(samples) {{\n    \
         return {{\n{returns}\n    }}\n}}\n",
        bands = names.join(", "),
        units = units.join(", "),
        outputs = outputs.join(",\n"),
        returns = returns.join(",\n"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::classify_band;

    fn classified(names: &[&str]) -> Vec<(String, BandClass)> {
        names
            .iter()
            .map(|name| (name.to_string(), classify_band(name)))
            .collect()
    }

    #[test]
    fn test_script_lists_every_band() {
        let script = generate(&classified(&["B02", "B03", "dataMask"]), true);

        assert!(script.starts_with("//VERSION=3"));
        assert!(script.contains("bands: [\"B02\", \"B03\", \"dataMask\"]"));
        assert!(script.contains("units: [\"DN\", \"DN\", \"DN\"]"));
        assert!(script.contains("{id: \"B02\", bands: 1, sampleType: \"UINT16\"}"));
        assert!(script.contains("{id: \"dataMask\", bands: 1, sampleType: \"UINT8\"}"));
        assert!(script.contains("B03: [samples.B03]"));
        assert!(script.contains("norm_factor"));
    }

    #[test]
    fn test_norm_factor_block_is_optional() {
        let script = generate(&classified(&["sunZenithAngles"]), false);
        assert!(!script.contains("updateOutputMetadata"));
        assert!(script.contains("sampleType: \"FLOAT32\""));
    }
}
