use anyhow::Context as _;

use crate::data_structures::texture;

#[cfg(target_arch = "wasm32")]
fn format_url(asset_dir: &str, file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().context("no browser window")?;
    let origin = window
        .location()
        .origin()
        .map_err(|e| anyhow::anyhow!("could not read the page origin: {e:?}"))?;
    let base = reqwest::Url::parse(&format!("{origin}/{}/", asset_dir.trim_matches('/')))?;
    Ok(base.join(file_name)?)
}

/// Reads `<asset_dir>/<file_name>`: from disk natively, over HTTP relative
/// to the page origin on the web.
pub async fn load_binary(asset_dir: &str, file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(asset_dir, file_name)?;
        reqwest::get(url.clone())
            .await
            .and_then(|response| response.error_for_status())
            .with_context(|| format!("could not fetch {url}"))?
            .bytes()
            .await?
            .to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = std::path::Path::new(asset_dir).join(file_name);
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("could not read {}", path.display()))?
    };

    Ok(data)
}

pub async fn load_texture(
    asset_dir: &str,
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<texture::Texture> {
    let data = load_binary(asset_dir, file_name).await?;
    texture::Texture::from_bytes(device, queue, &data, file_name)
}

/// Like [`load_texture`], but a missing or broken image only costs the
/// picture: the error is logged and a white 1x1 texture is returned.
pub async fn load_texture_or_placeholder(
    asset_dir: &str,
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> texture::Texture {
    match load_texture(asset_dir, file_name, device, queue).await {
        Ok(texture) => {
            log::info!("loaded texture {file_name}");
            texture
        }
        Err(e) => {
            log::error!("texture {file_name} unavailable, using a placeholder: {e:#}");
            texture::Texture::solid_colour(device, queue, [255; 4], file_name)
        }
    }
}
