//! Asset IO and material texture helpers.

/// Bind group layout for a model material: base colour texture plus sampler.
pub fn material_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
        label: Some("Material texture_bind_group_layout"),
    })
}

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().ok_or_else(|| anyhow::anyhow!("no window available"))?;
    let origin = window
        .location()
        .origin()
        .map_err(|e| anyhow::anyhow!("could not read the page origin: {e:?}"))?;
    let base = reqwest::Url::parse(&format!("{}/assets/", origin))?;
    Ok(base.join(file_name)?)
}

/// Read an asset relative to the asset root.
///
/// On the web this is `<origin>/assets/<file_name>`; natively it is
/// `./assets/<file_name>` relative to the working directory.
pub async fn load_binary(file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(file_name)?;
        let response = reqwest::get(url).await?.error_for_status()?;
        response.bytes().await?.to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = std::path::Path::new("./").join("assets").join(file_name);
        tokio::fs::read(&path)
            .await
            .map_err(|e| anyhow::anyhow!("could not read {}: {e}", path.display()))?
    };

    Ok(data)
}

/// Decode an encoded image, trusting the MIME type when the file declares one.
pub fn decode_image(bytes: &[u8], mime_type: Option<&str>) -> anyhow::Result<image::RgbaImage> {
    let image = match mime_type.and_then(image::ImageFormat::from_mime_type) {
        Some(format) => image::load_from_memory_with_format(bytes, format)?,
        None => image::load_from_memory(bytes)?,
    };
    Ok(image.to_rgba8())
}

/// Multiply every texel by a linear RGBA factor, in place.
pub fn apply_factor(image: &mut image::RgbaImage, factor: [f32; 4]) {
    if factor == [1.0; 4] {
        return;
    }
    for pixel in image.pixels_mut() {
        for (channel, f) in pixel.0.iter_mut().zip(factor) {
            *channel = (*channel as f32 * f).round().clamp(0.0, 255.0) as u8;
        }
    }
}
