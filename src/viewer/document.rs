//! Self-contained HTML document that renders one GLTF/GLB model with three.js.

use crate::viewer::bounds::{FALLBACK_SCALE, TARGET_SIZE};
use crate::viewer::protocol::{OUTBOX_GLOBAL, PROTOCOL_VERSION};

/// three.js release pulled from the CDN import map
pub const THREE_VERSION: &str = "0.160.0";

// Fixed scene settings
pub const BACKGROUND: u32 = 0x0a0a0a;
pub const CAMERA_FOV: f32 = 45.0;
pub const CAMERA_NEAR: f32 = 0.1;
pub const CAMERA_FAR: f32 = 1000.0;
pub const CAMERA_POSITION: [f32; 3] = [0.0, 2.0, 5.0];
pub const AMBIENT_INTENSITY: f32 = 1.0;
pub const MAIN_LIGHT_INTENSITY: f32 = 1.5;
pub const MAIN_LIGHT_POSITION: [f32; 3] = [5.0, 10.0, 7.5];
pub const FILL_LIGHT_COLOR: u32 = 0x667eea;
pub const FILL_LIGHT_INTENSITY: f32 = 0.8;
pub const FILL_LIGHT_POSITION: [f32; 3] = [-5.0, 5.0, -5.0];
pub const DAMPING_FACTOR: f32 = 0.05;
pub const AUTO_ROTATE_SPEED: f32 = 0.5;

/// Element ids the host may look for in the rendered page
pub const LOADING_ID: &str = "loading";
pub const ERROR_ID: &str = "error";
pub const CONTAINER_ID: &str = "container";

/// Page global holding the loaded model's raw bounding box as
/// `{ min: [x, y, z], max: [x, y, z] }`
pub const BOUNDS_GLOBAL: &str = "__flat3dBounds";

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0, maximum-scale=1.0, user-scalable=no" />
  <style>
    * { margin: 0; padding: 0; box-sizing: border-box; }
    body { background: @BACKGROUND_CSS@; overflow: hidden; }
    #container { width: 100vw; height: 100vh; }
    #loading, #error {
      position: absolute; top: 50%; left: 50%;
      transform: translate(-50%, -50%);
      text-align: center;
      font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, Helvetica, Arial, sans-serif;
    }
    #loading { color: white; font-size: 16px; }
    #error { display: none; color: #ff6b6b; }
    .spinner {
      border: 3px solid rgba(255,255,255,0.1);
      border-top: 3px solid #667eea;
      border-radius: 50%; width: 40px; height: 40px;
      animation: spin 1s linear infinite;
      margin: 0 auto 16px;
    }
    @keyframes spin { to { transform: rotate(360deg); } }
    .controls {
      position: absolute; bottom: 20px; left: 50%;
      transform: translateX(-50%);
      background: rgba(0,0,0,0.6);
      padding: 8px 16px; border-radius: 20px;
      color: rgba(255,255,255,0.8); font-size: 11px;
      font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, Helvetica, Arial, sans-serif;
      white-space: nowrap; pointer-events: none;
    }
  </style>
  <script type="importmap">
    {
      "imports": {
        "three": "https://unpkg.com/three@@THREE_VERSION@/build/three.module.js",
        "three/addons/": "https://unpkg.com/three@@THREE_VERSION@/examples/jsm/"
      }
    }
  </script>
</head>
<body>
  <div id="container"></div>
  <div id="loading"><div class="spinner"></div>Loading 3D Model...</div>
  <div class="controls">Drag to rotate &middot; Pinch to zoom</div>
  <div id="error"><div style="font-size:48px;margin-bottom:12px">&#10060;</div>Failed to load 3D model</div>

  <script type="module">
    import * as THREE from 'three';
    import { GLTFLoader } from 'three/addons/loaders/GLTFLoader.js';
    import { OrbitControls } from 'three/addons/controls/OrbitControls.js';

    const MODEL_URL = @MODEL_URL@;
    const TARGET_SIZE = @TARGET_SIZE@;
    const FALLBACK_SCALE = @FALLBACK_SCALE@;

    function post(type, message) {
      const payload = JSON.stringify({ v: @PROTOCOL_VERSION@, type: type, message: String(message) });
      if (window.ReactNativeWebView) {
        window.ReactNativeWebView.postMessage(payload);
      } else {
        (window.@OUTBOX@ = window.@OUTBOX@ || []).push(payload);
      }
    }
    const log = (msg) => post('log', msg);
    const errorLog = (msg) => post('error', msg);

    function showError() {
      document.getElementById('loading').style.display = 'none';
      document.getElementById('error').style.display = 'block';
    }

    let scene, camera, renderer, controls;

    function init() {
      log('Initializing 3D scene...');
      try {
        scene = new THREE.Scene();
        scene.background = new THREE.Color(@BACKGROUND@);

        camera = new THREE.PerspectiveCamera(@FOV@, window.innerWidth / window.innerHeight, @NEAR@, @FAR@);
        camera.position.set(@CAMERA_POSITION@);

        renderer = new THREE.WebGLRenderer({ antialias: true, alpha: true });
        renderer.setSize(window.innerWidth, window.innerHeight);
        renderer.setPixelRatio(window.devicePixelRatio);
        renderer.toneMapping = THREE.ACESFilmicToneMapping;
        renderer.toneMappingExposure = 1.2;
        document.getElementById('container').appendChild(renderer.domElement);

        scene.add(new THREE.AmbientLight(0xffffff, @AMBIENT@));

        const mainLight = new THREE.DirectionalLight(0xffffff, @MAIN_INTENSITY@);
        mainLight.position.set(@MAIN_POSITION@);
        scene.add(mainLight);

        const fillLight = new THREE.DirectionalLight(@FILL_COLOR@, @FILL_INTENSITY@);
        fillLight.position.set(@FILL_POSITION@);
        scene.add(fillLight);

        controls = new OrbitControls(camera, renderer.domElement);
        controls.enableDamping = true;
        controls.dampingFactor = @DAMPING@;
        controls.autoRotate = true;
        controls.autoRotateSpeed = @ROTATE_SPEED@;

        log('Loading model from: ' + MODEL_URL);
        new GLTFLoader().load(
          MODEL_URL,
          (gltf) => {
            log('Model loaded successfully');
            const model = gltf.scene;

            const box = new THREE.Box3().setFromObject(model);
            window.@BOUNDS@ = { min: box.min.toArray(), max: box.max.toArray() };
            const center = box.getCenter(new THREE.Vector3());
            const size = box.getSize(new THREE.Vector3());
            const maxDim = Math.max(size.x, size.y, size.z);
            const scale = Number.isFinite(maxDim) && maxDim > 0 ? TARGET_SIZE / maxDim : FALLBACK_SCALE;
            model.scale.setScalar(scale);
            if (Number.isFinite(center.x) && Number.isFinite(center.y) && Number.isFinite(center.z)) {
              model.position.sub(center.multiplyScalar(scale));
            }

            scene.add(model);
            document.getElementById('loading').style.display = 'none';
          },
          (xhr) => {
            const text = xhr.lengthComputable && xhr.total
              ? 'Loading... ' + Math.round((xhr.loaded / xhr.total) * 100) + '%'
              : 'Loading...';
            document.getElementById('loading').innerHTML = '<div class="spinner"></div>' + text;
          },
          (error) => {
            errorLog('Error loading model: ' + (error && error.message ? error.message : error));
            showError();
          }
        );

        window.addEventListener('resize', onWindowResize);
        animate();
      } catch (e) {
        errorLog('Init error: ' + e.message);
        showError();
      }
    }

    function onWindowResize() {
      camera.aspect = window.innerWidth / window.innerHeight;
      camera.updateProjectionMatrix();
      renderer.setSize(window.innerWidth, window.innerHeight);
    }

    function animate() {
      requestAnimationFrame(animate);
      if (controls) controls.update();
      if (renderer && scene && camera) renderer.render(scene, camera);
    }

    init();
  </script>
</body>
</html>
"#;

/// JS string literal for `value`, safe to place inside a `<script>` element
pub fn js_string_literal(value: &str) -> String {
    // A JSON string is a valid JS string literal. "</" and "<!--" must not
    // reach the HTML tokenizer inside a script element.
    let json = serde_json::Value::String(value.to_owned()).to_string();
    json.replace("</", "<\\/").replace("<!--", "<\\!--")
}

fn js_number(value: f32) -> String {
    // Debug keeps a trailing ".0", which JS reads the same way
    format!("{:?}", value)
}

fn js_vec3(v: [f32; 3]) -> String {
    format!("{}, {}, {}", js_number(v[0]), js_number(v[1]), js_number(v[2]))
}

fn hex_color(color: u32) -> String {
    format!("0x{:06x}", color)
}

/// Render the viewer document for one model URL
pub fn render(model_url: &str) -> String {
    let substitutions = [
        ("@BACKGROUND_CSS@", format!("#{:06x}", BACKGROUND)),
        ("@THREE_VERSION@", THREE_VERSION.to_string()),
        ("@TARGET_SIZE@", js_number(TARGET_SIZE)),
        ("@FALLBACK_SCALE@", js_number(FALLBACK_SCALE)),
        ("@BOUNDS@", BOUNDS_GLOBAL.to_string()),
        ("@PROTOCOL_VERSION@", PROTOCOL_VERSION.to_string()),
        ("@OUTBOX@", OUTBOX_GLOBAL.to_string()),
        ("@BACKGROUND@", hex_color(BACKGROUND)),
        ("@FOV@", js_number(CAMERA_FOV)),
        ("@NEAR@", js_number(CAMERA_NEAR)),
        ("@FAR@", js_number(CAMERA_FAR)),
        ("@CAMERA_POSITION@", js_vec3(CAMERA_POSITION)),
        ("@AMBIENT@", js_number(AMBIENT_INTENSITY)),
        ("@MAIN_INTENSITY@", js_number(MAIN_LIGHT_INTENSITY)),
        ("@MAIN_POSITION@", js_vec3(MAIN_LIGHT_POSITION)),
        ("@FILL_COLOR@", hex_color(FILL_LIGHT_COLOR)),
        ("@FILL_INTENSITY@", js_number(FILL_LIGHT_INTENSITY)),
        ("@FILL_POSITION@", js_vec3(FILL_LIGHT_POSITION)),
        ("@DAMPING@", js_number(DAMPING_FACTOR)),
        ("@ROTATE_SPEED@", js_number(AUTO_ROTATE_SPEED)),
        ("@MODEL_URL@", js_string_literal(model_url)),
    ];

    // The model URL goes in last so a token inside it is never expanded.
    substitutions
        .iter()
        .fold(TEMPLATE.to_string(), |doc, (token, value)| {
            doc.replace(token, value)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn module_script(doc: &str) -> String {
        let html = Html::parse_document(doc);
        let selector = Selector::parse(r#"script[type="module"]"#).unwrap();
        html.select(&selector)
            .next()
            .expect("module script")
            .text()
            .collect()
    }

    #[test]
    fn test_document_structure() {
        let doc = render("http://192.168.1.11:8000/media/3d_models/house.glb");
        let html = Html::parse_document(&doc);
        for id in [CONTAINER_ID, LOADING_ID, ERROR_ID] {
            let selector = Selector::parse(&format!("#{}", id)).unwrap();
            assert_eq!(html.select(&selector).count(), 1, "missing #{}", id);
        }
        let importmap = Selector::parse(r#"script[type="importmap"]"#).unwrap();
        let map: String = html.select(&importmap).next().unwrap().text().collect();
        let map: serde_json::Value = serde_json::from_str(&map).unwrap();
        assert_eq!(
            map["imports"]["three"],
            "https://unpkg.com/three@0.160.0/build/three.module.js"
        );
    }

    #[test]
    fn test_scene_settings_rendered() {
        let script = module_script(&render("http://host/a.glb"));
        assert!(script.contains("new THREE.Color(0x0a0a0a)"));
        assert!(script.contains("new THREE.PerspectiveCamera(45.0, window.innerWidth / window.innerHeight, 0.1, 1000.0)"));
        assert!(script.contains("camera.position.set(0.0, 2.0, 5.0)"));
        assert!(script.contains("new THREE.AmbientLight(0xffffff, 1.0)"));
        assert!(script.contains("new THREE.DirectionalLight(0x667eea, 0.8)"));
        assert!(script.contains("fillLight.position.set(-5.0, 5.0, -5.0)"));
        assert!(script.contains("controls.autoRotateSpeed = 0.5"));
        assert!(script.contains("const TARGET_SIZE = 3.5;"));
        assert!(script.contains("requestAnimationFrame(animate)"));
        assert!(script.contains("window.addEventListener('resize', onWindowResize)"));
        assert!(!script.contains("@MODEL_URL@"));
        assert!(!script.contains("@FOV@"));
    }

    #[test]
    fn test_zero_size_box_falls_back_to_unit_scale() {
        let script = module_script(&render("http://host/a.glb"));
        assert!(script.contains("const FALLBACK_SCALE = 1.0;"));
        assert!(script.contains(
            "const scale = Number.isFinite(maxDim) && maxDim > 0 ? TARGET_SIZE / maxDim : FALLBACK_SCALE;"
        ));
        assert!(script.contains("model.scale.setScalar(scale)"));
        assert!(script.contains("if (Number.isFinite(center.x) && Number.isFinite(center.y) && Number.isFinite(center.z))"));
        assert!(script.contains(
            "window.__flat3dBounds = { min: box.min.toArray(), max: box.max.toArray() };"
        ));
    }

    #[test]
    fn test_progress_without_total_is_indeterminate() {
        let script = module_script(&render("http://host/a.glb"));
        assert!(script.contains("const text = xhr.lengthComputable && xhr.total"));
        assert!(script.contains("? 'Loading... ' + Math.round((xhr.loaded / xhr.total) * 100) + '%'"));
        assert!(script.contains(": 'Loading...';"));
    }

    #[test]
    fn test_failure_hides_loading_and_reports() {
        let script = module_script(&render("http://host/a.glb"));
        let show_error = script
            .split("function showError() {")
            .nth(1)
            .and_then(|rest| rest.split('}').next())
            .expect("showError body");
        assert!(show_error.contains("document.getElementById('loading').style.display = 'none';"));
        assert!(show_error.contains("document.getElementById('error').style.display = 'block';"));

        let on_error = script
            .split("(error) => {")
            .nth(1)
            .and_then(|rest| rest.split('}').next())
            .expect("loader error callback");
        assert!(on_error.contains("errorLog('Error loading model: '"));
        assert!(on_error.contains("showError();"));
    }

    #[test]
    fn test_model_url_is_escaped() {
        let hostile = "http://host/a.glb';</script><script>alert(1)//";
        let doc = render(hostile);
        assert!(!doc.contains("</script><script>alert"));
        let script = module_script(&doc);
        assert!(script.contains(r#"const MODEL_URL = "http://host/a.glb';<\/script><script>alert(1)//";"#));
    }

    #[test]
    fn test_posts_versioned_envelopes() {
        let script = module_script(&render("http://host/a.glb"));
        assert!(script.contains("JSON.stringify({ v: 1, type: type, message: String(message) })"));
        assert!(script.contains("window.__flat3dOutbox"));
    }

    #[test]
    fn test_js_string_literal() {
        assert_eq!(js_string_literal("a\"b"), r#""a\"b""#);
        assert_eq!(js_string_literal("</x>"), r#""<\/x>""#);
    }
}
