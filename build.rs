use std::env;
use std::fs::{read_to_string, File};
use std::io::prelude::*;
use std::path::Path;

const SHADER_DIR: &str = "src/data";

fn save_into_spirv(dir: &str, filename: &str, out_dir: &Path) {
    for (ext, ty) in vec![
        (".vert", glsl_to_spirv::ShaderType::Vertex),
        (".frag", glsl_to_spirv::ShaderType::Fragment),
    ]
    .into_iter()
    {
        let path = dir.to_owned() + "/" + filename + ext;
        let out_path = out_dir.join(filename.to_owned() + ext + ".spv");
        println!("cargo:rerun-if-changed={}", path);

        let code = read_to_string(&path).unwrap_or_else(|err| panic!("read {}: {}", path, err));
        let mut file = glsl_to_spirv::compile(&code, ty).unwrap_or_else(|err| {
            eprintln!("compile {}:", path);
            panic!("{}", err)
        });
        let mut buf = vec![];
        file.read_to_end(&mut buf).expect("read compiled SPIR-V");

        let mut output = File::create(&out_path).expect("create SPIR-V output");
        output.write_all(&buf).expect("write SPIR-V output");
    }
}

fn main() {
    let out_dir = env::var("OUT_DIR").expect("OUT_DIR is set by cargo");
    let out_dir = Path::new(&out_dir);
    save_into_spirv(SHADER_DIR, "triangle", out_dir);
    save_into_spirv(SHADER_DIR, "spinning", out_dir);
}
