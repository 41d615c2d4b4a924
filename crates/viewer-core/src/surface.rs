use crate::state::Transform;

pub type Bitmap = image::RgbaImage;

/// Presentation target for one page.
pub trait Surface {
    /// Change the layout size; visible pixels may lag behind.
    fn resize(&mut self, width: u32, height: u32);

    fn replace_visible_content(&mut self, bitmap: Bitmap);

    fn apply_transform(&mut self, transform: Transform);

    fn set_loading(&mut self, loading: bool);
}

/// Surface that keeps everything in memory; used by the CLI and in tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    width: u32,
    height: u32,
    visible: Option<Bitmap>,
    transform: Transform,
    loading: bool,
    commits: usize,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn visible(&self) -> Option<&Bitmap> {
        self.visible.as_ref()
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Number of times the visible content has been swapped.
    pub fn commits(&self) -> usize {
        self.commits
    }
}

impl Surface for MemorySurface {
    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    fn replace_visible_content(&mut self, bitmap: Bitmap) {
        self.visible = Some(bitmap);
        self.commits += 1;
    }

    fn apply_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }
}
