use serde::Serialize;

pub const MIN_INFERENCE_STEPS: u32 = 10;
pub const DEFAULT_MODEL_ID: &str = "sdxl";
pub const NO_STYLE: &str = "none";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleEntry {
    pub id: &'static str,
    pub display_name: &'static str,
    pub prompt_suffix: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelEntry {
    pub id: &'static str,
    pub display_name: &'static str,
    pub remote_model_id: &'static str,
    pub max_steps: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionEntry {
    pub id: &'static str,
    pub display_name: &'static str,
    pub width: u32,
    pub height: u32,
}

pub const STYLES: &[StyleEntry] = &[
    StyleEntry { id: "none", display_name: "None", prompt_suffix: "" },
    StyleEntry {
        id: "3d-render",
        display_name: "3D Render",
        prompt_suffix: " in a highly detailed 3D render style, with realistic textures and lighting.",
    },
    StyleEntry {
        id: "acrylic",
        display_name: "Acrylic",
        prompt_suffix: " painted in an acrylic style, with thick brush strokes and bold colors.",
    },
    StyleEntry {
        id: "anime",
        display_name: "Anime",
        prompt_suffix: " in an anime style, featuring vibrant colors and expressive character design.",
    },
    StyleEntry {
        id: "creative",
        display_name: "Creative",
        prompt_suffix: " in a highly creative and imaginative way, pushing artistic boundaries.",
    },
    StyleEntry {
        id: "dynamic",
        display_name: "Dynamic",
        prompt_suffix: " with a dynamic and action-packed composition, full of motion and energy.",
    },
    StyleEntry {
        id: "fashion",
        display_name: "Fashion",
        prompt_suffix: " in a high-fashion editorial style, featuring elegant poses and stylish outfits.",
    },
    StyleEntry {
        id: "game-concept",
        display_name: "Game Concept",
        prompt_suffix: " designed as a concept for a next-generation video game.",
    },
    StyleEntry {
        id: "graphic-design-3d",
        display_name: "Graphic Design 3D",
        prompt_suffix: " in a 3D graphic design aesthetic, bold and futuristic.",
    },
    StyleEntry {
        id: "illustration",
        display_name: "Illustration",
        prompt_suffix: " as a professional digital illustration, highly detailed and artistic.",
    },
    StyleEntry {
        id: "portrait",
        display_name: "Portrait",
        prompt_suffix: " as a beautifully detailed portrait with realistic shading and depth.",
    },
    StyleEntry {
        id: "portrait-cinematic",
        display_name: "Portrait Cinematic",
        prompt_suffix: " in a cinematic portrait style, with dramatic lighting and deep contrast.",
    },
    StyleEntry {
        id: "portrait-fashion",
        display_name: "Portrait Fashion",
        prompt_suffix: " in a high-fashion portrait style, elegant and editorial.",
    },
    StyleEntry {
        id: "ray-traced",
        display_name: "Ray Traced",
        prompt_suffix: " using ray tracing technology, with ultra-realistic reflections and lighting.",
    },
    StyleEntry {
        id: "stock-photo",
        display_name: "Stock Photo",
        prompt_suffix: " as a high-quality stock photo, professionally composed and well-lit.",
    },
    StyleEntry {
        id: "watercolor",
        display_name: "Watercolor",
        prompt_suffix: " painted in soft watercolor tones, with delicate brush strokes and a dreamy feel.",
    },
];

pub const MODELS: &[ModelEntry] = &[
    ModelEntry {
        id: "sdxl",
        display_name: "Stable Diffusion XL",
        remote_model_id: "stability-ai/sdxl",
        max_steps: 50,
    },
    ModelEntry {
        id: "flux-schnell",
        display_name: "Flux Schnell",
        remote_model_id: "black-forest-labs/flux-schnell",
        max_steps: 16,
    },
    ModelEntry {
        id: "flux-dev",
        display_name: "Flux Dev",
        remote_model_id: "black-forest-labs/flux-dev",
        max_steps: 50,
    },
];

pub const DIMENSIONS: &[DimensionEntry] = &[
    DimensionEntry { id: "1:1", display_name: "Square", width: 1024, height: 1024 },
    DimensionEntry { id: "4:3", display_name: "Standard", width: 1024, height: 768 },
    DimensionEntry { id: "3:4", display_name: "Portrait", width: 768, height: 1024 },
    DimensionEntry { id: "16:9", display_name: "Wide", width: 1024, height: 576 },
];

pub fn find_style(id: &str) -> Option<&'static StyleEntry> {
    STYLES.iter().find(|style| style.id == id)
}

/// Suffix for a style id; `none` and unknown ids yield an empty suffix.
pub fn style_suffix(id: &str) -> &'static str {
    if id == NO_STYLE {
        return "";
    }
    find_style(id).map(|style| style.prompt_suffix).unwrap_or("")
}

pub fn find_model(id: &str) -> Option<&'static ModelEntry> {
    MODELS.iter().find(|model| model.id == id)
}

pub fn find_model_by_remote_id(remote_id: &str) -> Option<&'static ModelEntry> {
    MODELS.iter().find(|model| model.remote_model_id == remote_id)
}

pub fn default_model() -> &'static ModelEntry {
    &MODELS[0]
}

pub fn find_dimension(id: &str) -> Option<&'static DimensionEntry> {
    DIMENSIONS.iter().find(|dimension| dimension.id == id)
}

/// Everything the page needs to render its pickers.
#[derive(Debug, Serialize)]
pub struct CatalogView {
    pub styles: &'static [StyleEntry],
    pub models: &'static [ModelEntry],
    pub dimensions: &'static [DimensionEntry],
    #[serde(rename = "minSteps")]
    pub min_steps: u32,
}

pub fn catalog_view() -> CatalogView {
    CatalogView {
        styles: STYLES,
        models: MODELS,
        dimensions: DIMENSIONS,
        min_steps: MIN_INFERENCE_STEPS,
    }
}
