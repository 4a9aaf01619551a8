use std::cmp;
use std::ffi;

use gl;
use gl::types::*;

use crate::errors::Result;
use crate::utils::hash::FastHashSet;

/// Describes a version.
///
/// A version can only be compared to another version if they belong to the same API.
/// For example, both `Version::GL(3, 0) >= Version::ES(3, 0)` and `Version::ES(3, 0) >=
/// Version::GL(3, 0)` return `false`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Version {
    /// Regular OpenGL.
    GL(u8, u8),
    /// OpenGL embedded system.
    ES(u8, u8),
}

impl PartialOrd for Version {
    #[inline]
    fn partial_cmp(&self, other: &Version) -> Option<cmp::Ordering> {
        let (es1, major1, minor1) = match *self {
            Version::GL(major, minor) => (false, major, minor),
            Version::ES(major, minor) => (true, major, minor),
        };

        let (es2, major2, minor2) = match *other {
            Version::GL(major, minor) => (false, major, minor),
            Version::ES(major, minor) => (true, major, minor),
        };

        if es1 != es2 {
            None
        } else {
            match major1.cmp(&major2) {
                cmp::Ordering::Equal => Some(minor1.cmp(&minor2)),
                v => Some(v),
            }
        }
    }
}

impl Version {
    /// Parses a `GL_VERSION` string, like `4.5.0 NVIDIA 390.87` or
    /// `OpenGL ES 3.0 Mesa 18.0.5`.
    pub fn parse(desc: &str) -> Result<Version> {
        let (es, desc) = if desc.starts_with("OpenGL ES-") {
            (true, &desc[13..])
        } else if desc.starts_with("OpenGL ES ") {
            (true, &desc[10..])
        } else {
            (false, desc)
        };

        let desc = desc
            .split(' ')
            .next()
            .ok_or_else(|| backend_err!("[GL] Version string '{}' is malformed.", desc))?;

        let mut iter = desc.split('.');
        let major = iter.next().and_then(|v| v.parse().ok());
        let minor = iter.next().and_then(|v| v.parse().ok());

        match (major, minor) {
            (Some(major), Some(minor)) if es => Ok(Version::ES(major, minor)),
            (Some(major), Some(minor)) => Ok(Version::GL(major, minor)),
            _ => Err(backend_err!("[GL] Version string '{}' is malformed.", desc)),
        }
    }

    /// Returns true if this version offers multisample renderbuffers, blits,
    /// vertex array objects and instancing in core.
    pub fn is_preferred(self) -> bool {
        self >= Version::GL(3, 0) || self >= Version::ES(3, 0)
    }

    pub fn is_baseline(self) -> bool {
        self >= Version::GL(2, 0) || self >= Version::ES(2, 0)
    }
}

macro_rules! extensions {
    ($($string:expr => $field:ident,)+) => {
        /// Contains data about the list of extensions.
        #[derive(Debug, Clone)]
        pub struct Extensions {
            $(
                pub $field: bool,
            )+
            names: FastHashSet<String>,
        }

        impl Extensions {
            /// Returns the list of extensions supported by the backend.
            ///
            /// *Safety*: the OpenGL context corresponding to `gl` must be current
            /// in the thread.
            pub unsafe fn parse(version: Version) -> Result<Extensions> {
                let names: FastHashSet<String> = if version.is_preferred() {
                    let mut num_extensions = 0;
                    gl::GetIntegerv(gl::NUM_EXTENSIONS, &mut num_extensions);
                    (0 .. num_extensions).filter_map(|i| {
                        let ext = gl::GetStringi(gl::EXTENSIONS, i as GLuint);
                        if ext.is_null() {
                            None
                        } else {
                            Some(ffi::CStr::from_ptr(ext as *const _).to_string_lossy().into_owned())
                        }
                    }).collect()
                } else {
                    let list = gl::GetString(gl::EXTENSIONS);
                    if list.is_null() {
                        return Err(backend_err!("[GL] Extension string is null."));
                    }

                    ffi::CStr::from_ptr(list as *const _)
                        .to_string_lossy()
                        .split(' ')
                        .filter(|v| !v.is_empty())
                        .map(|v| v.to_owned())
                        .collect()
                };

                Ok(Extensions {
                    $(
                        $field: names.contains($string),
                    )+
                    names,
                })
            }

            #[inline]
            pub fn has(&self, name: &str) -> bool {
                self.names.contains(name)
            }
        }
    }
}

extensions! {
    "GL_ARB_vertex_array_object" => gl_arb_vertex_array_object,
    "GL_APPLE_vertex_array_object" => gl_apple_vertex_array_object,
    "GL_OES_vertex_array_object" => gl_oes_vertex_array_object,
    "GL_ARB_framebuffer_object" => gl_arb_framebuffer_object,
    "GL_EXT_framebuffer_blit" => gl_ext_framebuffer_blit,
    "GL_EXT_framebuffer_multisample" => gl_ext_framebuffer_multisample,
    "GL_ARB_instanced_arrays" => gl_arb_instanced_arrays,
    "GL_ARB_ES3_compatibility" => gl_arb_es3_compatibility,
    "GL_EXT_texture_compression_s3tc" => gl_ext_texture_compression_s3tc,
    "GL_EXT_texture_compression_dxt1" => gl_ext_texture_compression_dxt1,
}

/// Represents the capabilities of the context.
///
/// Contrary to the state, these values never change.
#[derive(Debug)]
pub struct Capabilities {
    /// Returns a version or release number. Vendor-specific information may follow the version
    /// number.
    pub version: Version,

    /// The company responsible for this GL implementation.
    pub vendor: String,

    /// The name of the renderer. This name is typically specific to a particular
    /// configuration of a hardware platform.
    pub renderer: String,

    /// The list of OpenGL extensions support by this implementation.
    pub extensions: Extensions,

    /// Maximum number of samples of a multisample renderbuffer. Zero if
    /// multisampling is not supported.
    pub max_samples: u32,

    /// Maximum number of textures that can be bound to a program.
    pub max_combined_texture_image_units: u32,
}

impl Capabilities {
    pub unsafe fn parse() -> Result<Capabilities> {
        let version = Version::parse(&Capabilities::parse_str(gl::VERSION)?)?;
        let extensions = Extensions::parse(version)?;

        Ok(Capabilities {
            version,
            vendor: Capabilities::parse_str(gl::VENDOR)?,
            renderer: Capabilities::parse_str(gl::RENDERER)?,
            max_samples: Capabilities::parse_max_samples(version, &extensions),
            max_combined_texture_image_units: Capabilities::parse_texture_image_units(),
            extensions,
        })
    }

    pub fn has_vertex_arrays(&self) -> bool {
        self.version.is_preferred()
            || self.extensions.gl_arb_vertex_array_object
            || self.extensions.gl_apple_vertex_array_object
            || self.extensions.gl_oes_vertex_array_object
    }

    pub fn has_instancing(&self) -> bool {
        self.version >= Version::GL(3, 3)
            || self.version >= Version::ES(3, 0)
            || self.extensions.gl_arb_instanced_arrays
    }

    #[inline]
    unsafe fn parse_str(id: GLenum) -> Result<String> {
        let s = gl::GetString(id);
        if s.is_null() {
            return Err(backend_err!("[GL] String of {} is null.", id));
        }

        Ok(ffi::CStr::from_ptr(s as *const _)
            .to_string_lossy()
            .into_owned())
    }

    #[inline]
    unsafe fn parse_max_samples(version: Version, exts: &Extensions) -> u32 {
        let multisample = version.is_preferred()
            || exts.gl_arb_framebuffer_object
            || (exts.gl_ext_framebuffer_multisample && exts.gl_ext_framebuffer_blit);

        if multisample {
            let mut val = 0;
            gl::GetIntegerv(gl::MAX_SAMPLES, &mut val);
            val.max(0) as u32
        } else {
            0
        }
    }

    #[inline]
    unsafe fn parse_texture_image_units() -> u32 {
        let mut val = 2;
        gl::GetIntegerv(gl::MAX_COMBINED_TEXTURE_IMAGE_UNITS, &mut val);
        val.max(0) as u32
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn version() {
        assert_eq!(
            Version::parse("4.5.0 NVIDIA 390.87").unwrap(),
            Version::GL(4, 5)
        );
        assert_eq!(
            Version::parse("OpenGL ES 3.0 Mesa 18.0.5").unwrap(),
            Version::ES(3, 0)
        );
        assert!(Version::parse("OpenGL").is_err());

        assert!(Version::GL(3, 3).is_preferred());
        assert!(!Version::GL(2, 1).is_preferred());
        assert!(Version::ES(2, 0).is_baseline());
        assert!(!(Version::GL(3, 0) >= Version::ES(3, 0)));
    }
}
