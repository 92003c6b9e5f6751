fn main() -> anyhow::Result<()> {
    attendance_flow_lib::run()
}
