//! Navigator patches installed before any page script runs.
//!
//! Each patch hides one signal headless automation commonly leaks. They are
//! registered with `Page.addScriptToEvaluateOnNewDocument`, so they apply to
//! every document the session loads, including redirects.

/// A named JavaScript patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StealthPatch {
    pub name: &'static str,
    pub source: &'static str,
}

const HIDE_WEBDRIVER: &str = r#"
Object.defineProperty(Navigator.prototype, 'webdriver', {
    get: () => false,
    configurable: true,
});
"#;

const LANGUAGES: &str = r#"
Object.defineProperty(Navigator.prototype, 'languages', {
    get: () => Object.freeze(['en-US', 'en']),
    configurable: true,
});
"#;

const CHROME_RUNTIME: &str = r#"
if (!window.chrome) {
    Object.defineProperty(window, 'chrome', {
        value: {},
        writable: true,
        configurable: true,
    });
}
if (!window.chrome.runtime) {
    window.chrome.runtime = {
        connect: () => ({ onMessage: { addListener() {} }, postMessage() {}, disconnect() {} }),
        sendMessage: () => {},
        id: undefined,
    };
}
window.chrome.app = window.chrome.app || { isInstalled: false };
window.chrome.csi = window.chrome.csi || (() => ({ onloadT: Date.now(), pageT: performance.now() }));
window.chrome.loadTimes = window.chrome.loadTimes || (() => ({ requestTime: Date.now() / 1000 }));
"#;

const PLUGINS: &str = r#"
(() => {
    const fake = [
        { name: 'PDF Viewer', filename: 'internal-pdf-viewer' },
        { name: 'Chrome PDF Viewer', filename: 'internal-pdf-viewer' },
        { name: 'Chromium PDF Viewer', filename: 'internal-pdf-viewer' },
    ];
    Object.defineProperty(Navigator.prototype, 'plugins', {
        get: () => fake.map((p) => Object.assign(Object.create(Plugin.prototype), p)),
        configurable: true,
    });
})();
"#;

const PERMISSIONS: &str = r#"
(() => {
    const permissions = window.navigator.permissions;
    if (!permissions || !permissions.query) return;
    const query = permissions.query.bind(permissions);
    permissions.query = (descriptor) =>
        descriptor && descriptor.name === 'notifications'
            ? Promise.resolve({ state: Notification.permission, onchange: null })
            : query(descriptor);
})();
"#;

const HARDWARE: &str = r#"
Object.defineProperty(Navigator.prototype, 'hardwareConcurrency', { get: () => 8, configurable: true });
Object.defineProperty(Navigator.prototype, 'deviceMemory', { get: () => 8, configurable: true });
"#;

const WEBGL_VENDOR: &str = r#"
(() => {
    const patch = (proto) => {
        if (!proto) return;
        const original = proto.getParameter;
        proto.getParameter = function (param) {
            if (param === 37445) return 'Intel Inc.';
            if (param === 37446) return 'Intel Iris OpenGL Engine';
            return original.call(this, param);
        };
    };
    patch(window.WebGLRenderingContext && WebGLRenderingContext.prototype);
    patch(window.WebGL2RenderingContext && WebGL2RenderingContext.prototype);
})();
"#;

const PATCHES: &[StealthPatch] = &[
    StealthPatch {
        name: "webdriver",
        source: HIDE_WEBDRIVER,
    },
    StealthPatch {
        name: "languages",
        source: LANGUAGES,
    },
    StealthPatch {
        name: "chrome.runtime",
        source: CHROME_RUNTIME,
    },
    StealthPatch {
        name: "plugins",
        source: PLUGINS,
    },
    StealthPatch {
        name: "permissions",
        source: PERMISSIONS,
    },
    StealthPatch {
        name: "hardware",
        source: HARDWARE,
    },
    StealthPatch {
        name: "webgl",
        source: WEBGL_VENDOR,
    },
];

/// Patches in installation order.
pub fn stealth_scripts() -> &'static [StealthPatch] {
    PATCHES
}
