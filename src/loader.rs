use thiserror::Error;

use crate::obj::load_obj_from_str;
use crate::scene::{Material, MeshNode, NodeKind, SceneGraph, SceneNode};

/// Reasons an asset can fail to arrive.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {url}: {source}")]
    Io {
        url: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },
    #[error("fetching {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("failed to parse {url}: {message}")]
    Parse { url: String, message: String },
}

/// Builds the node graph of an OBJ asset: one root group with a mesh node per part.
pub fn graph_from_obj(url: &str, data: &str) -> Result<SceneGraph, LoadError> {
    let parts = load_obj_from_str(data).map_err(|err| LoadError::Parse {
        url: url.to_string(),
        message: format!("{err:#}"),
    })?;

    let mut graph = SceneGraph::new(asset_name(url));
    let root = graph.root();
    for part in parts {
        graph.add_child(
            root,
            SceneNode::new(
                part.name,
                NodeKind::Mesh(MeshNode {
                    geometry: part.mesh,
                    material: Material::default(),
                }),
            ),
        );
    }
    Ok(graph)
}

/// File stem of the asset URL, used as the root node name.
pub fn asset_name(url: &str) -> String {
    let file = url
        .rsplit(&['/', '\\'][..])
        .next()
        .unwrap_or(url)
        .split(&['?', '#'][..])
        .next()
        .unwrap_or_default();
    let stem = file.rsplit_once('.').map_or(file, |(stem, _)| stem);
    if stem.is_empty() {
        "model".to_string()
    } else {
        stem.to_string()
    }
}

/// Reads and parses an asset from the local filesystem.
#[cfg(not(target_arch = "wasm32"))]
pub fn load_path(path: &str) -> Result<SceneGraph, LoadError> {
    let data = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        url: path.to_string(),
        source,
    })?;
    graph_from_obj(path, &data)
}

/// Loads an asset on a background thread and hands the outcome to `deliver`.
#[cfg(not(target_arch = "wasm32"))]
pub fn spawn_load<F>(path: String, deliver: F) -> std::io::Result<std::thread::JoinHandle<()>>
where
    F: FnOnce(Result<SceneGraph, LoadError>) + Send + 'static,
{
    std::thread::Builder::new()
        .name("asset-loader".to_string())
        .spawn(move || {
            log::debug!("loading asset {path}");
            deliver(load_path(&path));
        })
}

/// Fetches and parses an asset over HTTP.
#[cfg(target_arch = "wasm32")]
pub async fn fetch_url(url: &str) -> Result<SceneGraph, LoadError> {
    use gloo_net::http::Request;

    let fetch_error = |err: gloo_net::Error| LoadError::Fetch {
        url: url.to_string(),
        message: err.to_string(),
    };
    let response = Request::get(url).send().await.map_err(fetch_error)?;
    if !response.ok() {
        return Err(LoadError::Status {
            url: url.to_string(),
            status: response.status(),
        });
    }
    let text = response.text().await.map_err(fetch_error)?;
    graph_from_obj(url, &text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_PARTS: &str = "v 0 0 0\nv 1 0 0\nv 0 1 0\no Shell\nf 1 2 3\no Visor\nf 3 2 1\n";

    #[test]
    fn builds_one_mesh_node_per_part() {
        let graph = graph_from_obj("models/helmet.obj", TWO_PARTS).unwrap();
        assert_eq!(graph.root_node().name, "helmet");
        let meshes = graph.collect(SceneNode::is_mesh);
        assert_eq!(meshes.len(), 2);
        let names: Vec<_> = meshes
            .iter()
            .map(|id| graph.node(*id).unwrap().name.as_str())
            .collect();
        assert_eq!(names, ["Shell", "Visor"]);
    }

    #[test]
    fn parse_failure_names_the_url() {
        let err = graph_from_obj("broken.obj", "not an obj").unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
        assert!(err.to_string().contains("broken.obj"));
    }

    #[test]
    fn asset_name_strips_path_query_and_extension() {
        assert_eq!(asset_name("https://host/a/DamagedHelmet.gltf?v=2"), "DamagedHelmet");
        assert_eq!(asset_name("C:\\models\\crate.obj"), "crate");
        assert_eq!(asset_name(""), "model");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_path("/definitely/not/here.obj").unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
