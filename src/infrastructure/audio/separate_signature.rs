use crate::domain::GenerationParams;

/// Optional keyword arguments the model's `separate(path, description=...)`
/// takes besides the description. Read from the method signature at load time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeparateSignature {
    pub seed: bool,
    pub guidance_scale: bool,
}

/// Generation parameters that may be passed on to `separate`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SeparateKwargs {
    pub seed: Option<u64>,
    pub guidance_scale: Option<f32>,
}

impl SeparateSignature {
    /// `accepts_any` is true when the method takes `**kwargs`.
    pub fn from_parameters<'a>(names: impl IntoIterator<Item = &'a str>, accepts_any: bool) -> Self {
        let mut signature = Self {
            seed: accepts_any,
            guidance_scale: accepts_any,
        };
        for name in names {
            match name {
                "seed" => signature.seed = true,
                "guidance_scale" => signature.guidance_scale = true,
                _ => {}
            }
        }
        signature
    }

    pub fn kwargs(&self, params: &GenerationParams) -> SeparateKwargs {
        SeparateKwargs {
            seed: params.seed.filter(|_| self.seed),
            guidance_scale: params.guidance_scale.filter(|_| self.guidance_scale),
        }
    }

    /// Names of requested parameters the model cannot take.
    pub fn unsupported(&self, params: &GenerationParams) -> Vec<&'static str> {
        let mut names = Vec::new();
        if params.seed.is_some() && !self.seed {
            names.push("seed");
        }
        if params.guidance_scale.is_some() && !self.guidance_scale {
            names.push("guidance_scale");
        }
        names
    }
}
