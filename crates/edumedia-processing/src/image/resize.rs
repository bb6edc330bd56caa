use image::imageops::FilterType;

pub struct ImageResize;

impl ImageResize {
    /// Largest size that fits inside `max_width` x `max_height` with the
    /// aspect ratio of `width` x `height`. Never upscales.
    ///
    /// Integer math with floor rounding, so the result never exceeds the box
    /// on either axis. Each side is at least 1px.
    pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
        if width <= max_width && height <= max_height {
            return (width, height);
        }
        if width == 0 || height == 0 {
            return (width.min(max_width), height.min(max_height));
        }

        let (w, h) = (width as u64, height as u64);
        let (mw, mh) = (max_width as u64, max_height as u64);

        // Compare w/h against mw/mh without division.
        if w * mh >= h * mw {
            let new_height = (h * mw / w).max(1);
            (max_width, new_height as u32)
        } else {
            let new_width = (w * mh / h).max(1);
            (new_width as u32, max_height)
        }
    }

    /// Pick a resampling filter by downscale factor: cheap filters for large
    /// reductions, Lanczos for small ones.
    pub fn select_filter(src_w: u32, src_h: u32, dst_w: u32, dst_h: u32) -> FilterType {
        let scale_x = src_w as f64 / dst_w.max(1) as f64;
        let scale_y = src_h as f64 / dst_h.max(1) as f64;
        let scale = scale_x.max(scale_y);

        if scale > 2.0 {
            FilterType::Triangle
        } else if scale > 1.5 {
            FilterType::CatmullRom
        } else {
            FilterType::Lanczos3
        }
    }
}
