fn main() {
    diario_obra_lib::run()
}
